pub mod item;
pub mod loaders;
pub mod progress;
pub mod selector;

pub use item::{AutomationReport, AutomationRequest, BatchResult, Product, RequestedItem};
pub use loaders::{load_shopping_list, ShoppingList};
pub use progress::{ChannelSink, LogSink, ProgressEvent, ProgressSink, ProgressSpan, ProgressStatus};
pub use selector::{Platform, PlatformTag, SelectorCandidate, SelectorList, Strategy};
