pub mod annotator;
pub mod notifier;
