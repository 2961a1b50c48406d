#![allow(dead_code)]

pub mod mock_field;
pub mod mock_view;
pub mod recorder;

use mock_field::MockTextField;
use mock_view::MockTextView;
use recorder::Recorder;
use weft_native_core::{FieldOptions, KeyCode, PositionUnit, TextField, TextView};

/// A mock-backed text view bound to `content`, with a key callback that
/// handles nothing.
pub fn bound_view(unit: PositionUnit, content: &str) -> (TextView<MockTextView>, Recorder) {
    bound_view_with_keys(unit, content, |_| false)
}

pub fn bound_view_with_keys(
    unit: PositionUnit,
    content: &str,
    handles: impl Fn(KeyCode) -> bool + 'static,
) -> (TextView<MockTextView>, Recorder) {
    let view = MockTextView::text_view(unit);
    let recorder = Recorder::new();
    view.bind(
        content,
        recorder.sink(),
        recorder.token(),
        recorder.key_callback(handles),
    );
    (view, recorder)
}

/// A mock-backed text field bound to `text`, announcing `token` on focus.
pub fn bound_field(
    options: FieldOptions,
    text: &str,
    token: i32,
) -> (TextField<MockTextField>, Recorder) {
    let field = MockTextField::text_field(options);
    let recorder = Recorder::new();
    field.bind(
        text,
        recorder.text_binding(),
        recorder.token(),
        recorder.action(),
        token,
    );
    (field, recorder)
}
