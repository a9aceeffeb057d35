mod controller;
mod hover;
mod model;

#[cfg(test)]
mod tests;

pub use controller::{EditorController, LabelingChangedEvent, LabelingListener};
pub use hover::HoverService;
pub use model::{EditorModel, ViewNotifier};
