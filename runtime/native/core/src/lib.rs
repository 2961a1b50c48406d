//! Weft native adapter core
//!
//! Toolkit-independent half of the weft native backends. A retained-mode UI
//! core drives native toolkits through this crate:
//!
//! - input arrives as toolkit events, is reduced to a [`RawEvent`] by the
//!   backend and normalized into a [`CanonicalEvent`] by the
//!   [`EventTranslator`];
//! - editable text is kept in step with the core's document by a
//!   [`TextView`], which mirrors content, selection and attributes and
//!   suppresses echo notifications with a scoped [`ApplyGuard`];
//! - single-line entries and read-only labels are driven the same way by a
//!   [`TextField`] and a [`TextLabel`];
//! - capabilities the core hands over (key callbacks, focus bindings,
//!   document sinks, window delegates) live in [`Slot`]s and are released
//!   exactly once.
//!
//! Backends (`weft-native-gtk`, `weft-native-winit`) implement
//! [`NativeTextView`], [`NativeTextField`], [`NativeLabel`] and
//! [`NativeAdapter`] for their toolkit.

pub mod adapter;
pub mod event;
pub mod ffi;
pub mod focus;
pub mod guard;
pub mod handle;
pub mod keys;
pub mod schedule;
pub mod text;
pub mod translate;
pub mod window;

pub use adapter::{AdapterConfig, AdapterError, FontCache, FontError, FontLoader, NativeAdapter};
pub use event::{CanonicalEvent, CursorKind, Modifiers, NativeEventRef, KEY_CHARACTERS_CAPACITY};
pub use focus::{FocusToken, FocusTracker};
pub use guard::{ApplyFlag, ApplyGuard};
pub use handle::{
    ActionCallback, DocumentSink, DocumentUpdate, KeyCallback, Slot, TextBinding, TokenBinding,
};
pub use keys::{classify, KeyCode, KeyDisposition, NavKey};
pub use schedule::{Coalescer, LocalQueue, MainThreadQueue, MainThreadSender, UiScheduler};
pub use text::{
    CharAttributes, Color, Document, FieldOptions, Justification, LineAttributes, NativeLabel,
    NativeTextField, NativeTextView, PositionUnit, SyncState, TextField, TextLabel, TextStyle,
    TextView, WeakTextField, WeakTextView,
};
pub use translate::{EventTranslator, KeyPhase, PointerButton, PointerLatch, RawEvent};
pub use window::{WindowDelegate, WindowPhase, WindowShell};
