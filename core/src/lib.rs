mod decycle;
mod dispatch;
mod expansion;
mod handlers;
mod ids;
mod models;
mod preview;
mod propagation;
mod segment;
mod settings;
mod tree;
mod value;

pub use crate::decycle::{decycle, ROOT_PATH};
pub use crate::dispatch::{
  ClickChain, DispatchOutcome, FnClickHandler, IsClickableValueFn, LegacyClickHandler,
  ValueClickEmitter, ValueClickHandler,
};
pub use crate::expansion::{auto_expand, ExpansionStore};
pub use crate::handlers::{
  default_value_click_handlers, FollowLinkHandler, LinkOpener, OpenRequest, SystemLinkOpener,
  VALUE_CLICK_HANDLERS,
};
pub use crate::ids::{default_id_generator, IdGenerator, RequestIdGenerator, SequentialIdGenerator, ID_PREFIX};
pub use crate::models::{ParentRef, Row, Segment, SegmentType};
pub use crate::preview::{preview, preview_with, PreviewOptions, ELLIPSIS};
pub use crate::propagation::{stop_click_propagation, ClickEvent};
pub use crate::segment::{build_root, classify, describe, root_type, SegmentBuilder};
pub use crate::settings::TreeSettings;
pub use crate::tree::{TreeNode, TreeOptions};
pub use crate::value::{iso_timestamp, number_text, Callable, Opaque, SharedList, SharedMap, Value, REF_KEY};

pub use crate::tree::TreeError;
