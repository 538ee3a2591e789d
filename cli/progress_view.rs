use colored::Colorize;
use footfall_core::Progress;
use std::{
	io::Write,
	sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender},
	thread::{spawn, JoinHandle},
	time::Duration,
};

/// This draws the current stage of training on a single line of stderr, redrawing it from a background thread so the epoch count stays current while the solver runs.
pub struct ProgressView {
	thread: Option<JoinHandle<()>>,
	sender: Option<Sender<Option<Progress>>>,
}

impl ProgressView {
	pub fn new() -> Self {
		let (sender, receiver) = channel::<Option<Progress>>();
		let thread = Some(spawn(move || thread_main(receiver)));
		Self {
			thread,
			sender: Some(sender),
		}
	}

	pub fn update(&mut self, progress: Progress) {
		if let Some(sender) = self.sender.as_ref() {
			sender.send(Some(progress)).ok();
		}
	}
}

impl Drop for ProgressView {
	fn drop(&mut self) {
		if let Some(sender) = self.sender.take() {
			sender.send(None).ok();
		}
		if let Some(thread) = self.thread.take() {
			thread.join().ok();
		}
	}
}

fn thread_main(receiver: Receiver<Option<Progress>>) {
	let mut progress = None;
	loop {
		match receiver.recv_timeout(Duration::from_millis(100)) {
			Err(RecvTimeoutError::Timeout) => {}
			Err(RecvTimeoutError::Disconnected) | Ok(None) => break,
			Ok(Some(new_progress)) => {
				// Finish the line for the previous stage before starting the next.
				if progress.is_some() {
					eprintln!();
				}
				progress = Some(new_progress);
			}
		};
		if let Some(progress) = progress.as_ref() {
			eprint!("\r{}", format_progress(progress));
			std::io::stderr().flush().ok();
		}
	}
	if progress.is_some() {
		eprintln!();
	}
}

fn format_progress(progress: &Progress) -> String {
	match progress {
		Progress::Loading => format!("{} records", "loading".bold()),
		Progress::Normalizing => format!("{} visit rates", "normalizing".bold()),
		Progress::Splitting => format!("{} records", "splitting".bold()),
		Progress::Encoding => format!("{} features", "encoding".bold()),
		Progress::Training(train_progress) => {
			let counter = &train_progress.0;
			format!(
				"{} epoch {} of at most {} ({:.1}%)",
				"training".bold(),
				counter.get(),
				counter.total(),
				100.0 * counter.fraction(),
			)
		}
		Progress::Testing => format!("{} on the test set", "evaluating".bold()),
	}
}
