//! Scroll types carried by `move-handle` and similar action signals.

use keyloom_core::{EnumType, EnumValue, ParamType, Value};

/// A scroll request: a step or a page in some direction, or a jump to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ScrollType {
    StepBackward = 2,
    StepForward = 3,
    PageBackward = 4,
    PageForward = 5,
    StepUp = 6,
    StepDown = 7,
    PageUp = 8,
    PageDown = 9,
    StepLeft = 10,
    StepRight = 11,
    PageLeft = 12,
    PageRight = 13,
    Start = 14,
    End = 15,
}

/// Runtime description of [`ScrollType`] for signal signatures and the
/// binding grammar. Values resolve by name (`SCROLL_STEP_LEFT`) or nick
/// (`step-left`).
pub static SCROLL_TYPE: EnumType = EnumType::new(
    "ScrollType",
    &[
        EnumValue { value: 2, name: "SCROLL_STEP_BACKWARD", nick: "step-backward" },
        EnumValue { value: 3, name: "SCROLL_STEP_FORWARD", nick: "step-forward" },
        EnumValue { value: 4, name: "SCROLL_PAGE_BACKWARD", nick: "page-backward" },
        EnumValue { value: 5, name: "SCROLL_PAGE_FORWARD", nick: "page-forward" },
        EnumValue { value: 6, name: "SCROLL_STEP_UP", nick: "step-up" },
        EnumValue { value: 7, name: "SCROLL_STEP_DOWN", nick: "step-down" },
        EnumValue { value: 8, name: "SCROLL_PAGE_UP", nick: "page-up" },
        EnumValue { value: 9, name: "SCROLL_PAGE_DOWN", nick: "page-down" },
        EnumValue { value: 10, name: "SCROLL_STEP_LEFT", nick: "step-left" },
        EnumValue { value: 11, name: "SCROLL_STEP_RIGHT", nick: "step-right" },
        EnumValue { value: 12, name: "SCROLL_PAGE_LEFT", nick: "page-left" },
        EnumValue { value: 13, name: "SCROLL_PAGE_RIGHT", nick: "page-right" },
        EnumValue { value: 14, name: "SCROLL_START", nick: "start" },
        EnumValue { value: 15, name: "SCROLL_END", nick: "end" },
    ],
);

/// The step a scroll type asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollStep {
    /// Move by this many single steps (negative is backwards).
    Step(i32),
    /// Move by this many pages (negative is backwards).
    Page(i32),
    Start,
    End,
}

impl ScrollType {
    pub const ALL: [ScrollType; 14] = [
        Self::StepBackward,
        Self::StepForward,
        Self::PageBackward,
        Self::PageForward,
        Self::StepUp,
        Self::StepDown,
        Self::PageUp,
        Self::PageDown,
        Self::StepLeft,
        Self::StepRight,
        Self::PageLeft,
        Self::PageRight,
        Self::Start,
        Self::End,
    ];

    #[inline]
    pub fn value(self) -> i32 {
        self as i32
    }

    pub fn from_value(value: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.value() == value)
    }

    /// The enum value name, e.g. `SCROLL_STEP_LEFT`.
    pub fn name(self) -> &'static str {
        SCROLL_TYPE.from_value(self.value()).map(|v| v.name).unwrap_or("")
    }

    pub fn param_type() -> ParamType {
        ParamType::Enum(&SCROLL_TYPE)
    }

    /// Extract a scroll type from a signal argument.
    pub fn from_arg(value: &Value) -> Option<Self> {
        value.as_enum(&SCROLL_TYPE).and_then(Self::from_value)
    }

    pub fn step(self) -> ScrollStep {
        match self {
            Self::StepLeft | Self::StepUp | Self::StepBackward => ScrollStep::Step(-1),
            Self::StepRight | Self::StepDown | Self::StepForward => ScrollStep::Step(1),
            Self::PageLeft | Self::PageUp | Self::PageBackward => ScrollStep::Page(-1),
            Self::PageRight | Self::PageDown | Self::PageForward => ScrollStep::Page(1),
            Self::Start => ScrollStep::Start,
            Self::End => ScrollStep::End,
        }
    }
}

impl From<ScrollType> for Value {
    fn from(scroll: ScrollType) -> Self {
        Value::Enum {
            ty: &SCROLL_TYPE,
            value: scroll.value(),
        }
    }
}
