//! Lazily constructed, mutually exclusive UI widgets.
//!
//! At most one widget is attached to the view at a time. Widgets are built
//! on first use through a [`WidgetHost`], which owns the actual UI objects;
//! the registry only tracks which instances exist and which one is shown.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SceneError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    Editor,
    Weather,
    ShadowCast,
    Daylight,
}

impl WidgetKind {
    pub const ALL: [WidgetKind; 4] = [
        WidgetKind::Editor,
        WidgetKind::Weather,
        WidgetKind::ShadowCast,
        WidgetKind::Daylight,
    ];

    /// Identifier used by the browser's widget picker.
    pub fn id(self) -> &'static str {
        match self {
            WidgetKind::Editor => "editor",
            WidgetKind::Weather => "weather",
            WidgetKind::ShadowCast => "shadowcast",
            WidgetKind::Daylight => "daylight",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WidgetKind::Editor => "Editor",
            WidgetKind::Weather => "Weather",
            WidgetKind::ShadowCast => "Shadow Cast",
            WidgetKind::Daylight => "Daylight",
        }
    }

    /// Parse a picker selection, where `none` (or an empty string) means no widget.
    pub fn parse_selection(id: &str) -> Result<Option<WidgetKind>, SceneError> {
        let id = id.trim();
        if id.is_empty() || id.eq_ignore_ascii_case("none") {
            return Ok(None);
        }
        id.parse().map(Some)
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl FromStr for WidgetKind {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WidgetKind::ALL
            .into_iter()
            .find(|k| k.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SceneError::UnknownWidget(s.to_string()))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum UiPosition {
    #[default]
    TopRight,
    TopLeft,
    BottomRight,
    BottomLeft,
}

/// What happens to a widget when another one replaces it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Teardown {
    /// Detach only; the instance is reused next time.
    #[default]
    Keep,
    /// Detach and destroy; the next switch builds a fresh instance.
    Destroy,
}

/// The UI the widgets live in.
pub trait WidgetHost<W> {
    fn construct(&mut self, kind: WidgetKind) -> Result<W, String>;
    fn attach(&mut self, widget: &W, position: UiPosition);
    fn detach(&mut self, widget: &W);
    fn destroy(&mut self, widget: W) {
        drop(widget);
    }
}

#[derive(Debug)]
pub struct WidgetRegistry<W> {
    slots: [Option<W>; 4],
    active: Option<WidgetKind>,
    teardown: Teardown,
    position: UiPosition,
}

impl<W> Default for WidgetRegistry<W> {
    fn default() -> Self {
        Self::new(Teardown::default())
    }
}

impl<W> WidgetRegistry<W> {
    pub fn new(teardown: Teardown) -> Self {
        Self {
            slots: [None, None, None, None],
            active: None,
            teardown,
            position: UiPosition::TopRight,
        }
    }

    pub fn active(&self) -> Option<WidgetKind> {
        self.active
    }

    pub fn teardown_policy(&self) -> Teardown {
        self.teardown
    }

    pub fn is_constructed(&self, kind: WidgetKind) -> bool {
        self.slots[kind.slot()].is_some()
    }

    pub fn get(&self, kind: WidgetKind) -> Option<&W> {
        self.slots[kind.slot()].as_ref()
    }

    /// Show `target` (or nothing) in place of the active widget.
    ///
    /// If construction fails no widget is left active.
    pub fn switch<H: WidgetHost<W>>(
        &mut self,
        host: &mut H,
        target: Option<WidgetKind>,
    ) -> Result<Option<WidgetKind>, SceneError> {
        if target == self.active {
            return Ok(self.active);
        }

        if let Some(previous) = self.active.take() {
            self.release(host, previous);
        }

        let Some(kind) = target else {
            return Ok(None);
        };

        let slot = &mut self.slots[kind.slot()];
        if slot.is_none() {
            debug!("constructing {} widget", kind.id());
            let widget = host.construct(kind).map_err(|message| {
                warn!("{} widget construction failed: {message}", kind.id());
                SceneError::Widget { kind, message }
            })?;
            *slot = Some(widget);
        }
        if let Some(widget) = slot.as_ref() {
            host.attach(widget, self.position);
        }
        self.active = Some(kind);
        Ok(self.active)
    }

    /// Detach the active widget and destroy every constructed one.
    pub fn teardown<H: WidgetHost<W>>(&mut self, host: &mut H) {
        if let Some(active) = self.active.take() {
            if let Some(widget) = self.slots[active.slot()].as_ref() {
                host.detach(widget);
            }
        }
        for slot in &mut self.slots {
            if let Some(widget) = slot.take() {
                host.destroy(widget);
            }
        }
    }

    fn release<H: WidgetHost<W>>(&mut self, host: &mut H, kind: WidgetKind) {
        let slot = &mut self.slots[kind.slot()];
        if let Some(widget) = slot.as_ref() {
            host.detach(widget);
        }
        if self.teardown == Teardown::Destroy {
            if let Some(widget) = slot.take() {
                host.destroy(widget);
            }
        }
    }
}
