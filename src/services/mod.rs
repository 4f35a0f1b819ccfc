// Services that turn a launch plan into running processes
pub mod process_launcher;
pub mod sequencer;

#[cfg(test)]
pub mod mock_launcher;
