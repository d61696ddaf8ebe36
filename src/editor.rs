// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation editor state machine.
//!
//! Turns pointer and keyboard input on the canvas into [`EditorAction`]s.
//! The editor never touches the store; the application applies the actions
//! it returns. All positions are percentages of the canvas, so the machine
//! behaves the same at any zoom level.

use crate::models::annotation::{
    AnnotationId, Arrow, Callout, Point, Region, Shape, TextLabel, DEFAULT_FONT_SIZE,
};
use crate::models::project::Step;
use crate::util::color::DEFAULT_ANNOTATION_COLOR;

/// Drafts at or below this size (in percent, on both axes) are discarded.
pub const MIN_DRAW_SIZE: f64 = 1.0;

pub const ZOOM_MIN: f32 = 0.5;
pub const ZOOM_MAX: f32 = 3.0;
pub const ZOOM_KEY_STEP: f32 = 0.25;
pub const ZOOM_WHEEL_STEP: f32 = 0.1;

/// Current drawing tool selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Select,
    Callout,
    Box,
    Circle,
    Arrow,
    Cursor,
    Text,
    Highlight,
    Blur,
}

impl Tool {
    /// Toolbar order.
    pub const ALL: [Tool; 9] = [
        Tool::Select,
        Tool::Callout,
        Tool::Box,
        Tool::Circle,
        Tool::Arrow,
        Tool::Cursor,
        Tool::Text,
        Tool::Highlight,
        Tool::Blur,
    ];

    pub fn shortcut(self) -> char {
        match self {
            Tool::Select => 'v',
            Tool::Callout => '1',
            Tool::Box => 'r',
            Tool::Circle => 'o',
            Tool::Arrow => 'a',
            Tool::Cursor => 'c',
            Tool::Text => 't',
            Tool::Highlight => 'h',
            Tool::Blur => 'b',
        }
    }

    pub fn from_shortcut(key: char) -> Option<Tool> {
        let key = key.to_ascii_lowercase();
        Tool::ALL.into_iter().find(|t| t.shortcut() == key)
    }

    pub fn label(self) -> &'static str {
        match self {
            Tool::Select => "Select",
            Tool::Callout => "Numbered Callout",
            Tool::Box => "Rectangle",
            Tool::Circle => "Circle",
            Tool::Arrow => "Arrow",
            Tool::Cursor => "Click Here",
            Tool::Text => "Text",
            Tool::Highlight => "Highlight",
            Tool::Blur => "Blur/Redact",
        }
    }
}

/// View-only scale factor of the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zoom(f32);

impl Default for Zoom {
    fn default() -> Self {
        Zoom(1.0)
    }
}

impl Zoom {
    pub fn factor(self) -> f32 {
        self.0
    }

    fn adjust(&mut self, delta: f32) {
        // Round to hundredths so repeated steps don't drift.
        let next = ((self.0 + delta) * 100.0).round() / 100.0;
        self.0 = next.clamp(ZOOM_MIN, ZOOM_MAX);
    }

    pub fn zoom_in(&mut self) {
        self.adjust(ZOOM_KEY_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.adjust(-ZOOM_KEY_STEP);
    }

    pub fn reset(&mut self) {
        self.0 = 1.0;
    }

    /// Ctrl/Cmd + scroll: positive `direction` zooms in.
    pub fn wheel(&mut self, direction: f32) {
        if direction > 0.0 {
            self.adjust(ZOOM_WHEEL_STEP);
        } else if direction < 0.0 {
            self.adjust(-ZOOM_WHEEL_STEP);
        }
    }
}

/// Keys the editor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKey {
    Char(char),
    Delete,
    Backspace,
    Escape,
}

/// Shape being drawn but not yet committed.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub start: Point,
    pub shape: Shape,
}

impl Draft {
    /// Whether the draft is large enough to keep.
    pub fn has_size(&self) -> bool {
        match &self.shape {
            Shape::Arrow(arrow) => arrow.has_end(),
            shape => shape
                .region()
                .map(|r| r.width.abs() > MIN_DRAW_SIZE || r.height.abs() > MIN_DRAW_SIZE)
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    /// Waiting for input; the select tool lives here.
    Idle,
    Drawing(Draft),
    Dragging { id: AnnotationId, offset: Point },
    /// Text tool clicked; waiting for the text to place at `at`.
    PendingText { at: Point },
}

/// Change the application should make to the step being edited.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorAction {
    None,
    Add { color: String, shape: Shape },
    Move { id: AnnotationId, shape: Shape },
    Delete(AnnotationId),
}

/// Interaction state of the annotation canvas.
#[derive(Debug, Clone)]
pub struct AnnotationEditor {
    tool: Tool,
    color: String,
    mode: Mode,
    selected: Option<AnnotationId>,
    zoom: Zoom,
}

impl Default for AnnotationEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationEditor {
    pub fn new() -> Self {
        Self {
            tool: Tool::Select,
            color: DEFAULT_ANNOTATION_COLOR.to_string(),
            mode: Mode::Idle,
            selected: None,
            zoom: Zoom::default(),
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn selected(&self) -> Option<AnnotationId> {
        self.selected
    }

    pub fn zoom(&self) -> Zoom {
        self.zoom
    }

    pub fn zoom_mut(&mut self) -> &mut Zoom {
        &mut self.zoom
    }

    /// Switch tools; any unfinished draft is dropped.
    pub fn set_tool(&mut self, tool: Tool) {
        if self.tool != tool {
            log::debug!("Tool changed to {:?}", tool);
        }
        self.tool = tool;
        self.mode = Mode::Idle;
    }

    /// Color for annotations created from now on.
    pub fn set_color(&mut self, color: impl Into<String>) {
        self.color = color.into();
    }

    pub fn select(&mut self, id: Option<AnnotationId>) {
        self.selected = id;
    }

    /// Forget per-step state when another step is opened.
    pub fn reset_for_step(&mut self) {
        self.mode = Mode::Idle;
        self.selected = None;
    }

    /// The draft to render as a preview, if one is in progress.
    pub fn draft(&self) -> Option<&Draft> {
        match &self.mode {
            Mode::Drawing(draft) => Some(draft),
            _ => None,
        }
    }

    /// Pointer pressed at `pos`; `hit` is the annotation under the pointer.
    pub fn pointer_down(&mut self, step: &Step, pos: Point, hit: Option<AnnotationId>) -> EditorAction {
        if matches!(self.mode, Mode::PendingText { .. }) {
            return EditorAction::None;
        }

        let color = self.color.clone();
        let shape = match self.tool {
            Tool::Select => {
                match hit.and_then(|id| step.annotation(id)) {
                    Some(annotation) => {
                        self.selected = Some(annotation.id);
                        self.mode = Mode::Dragging {
                            id: annotation.id,
                            offset: annotation.shape.anchor().offset_to(pos),
                        };
                    }
                    None => {
                        self.selected = None;
                        self.mode = Mode::Idle;
                    }
                }
                return EditorAction::None;
            }
            Tool::Text => {
                self.mode = Mode::PendingText { at: pos };
                return EditorAction::None;
            }
            Tool::Callout => {
                self.mode = Mode::Idle;
                return EditorAction::Add {
                    color,
                    shape: Shape::Callout(Callout {
                        x: pos.x,
                        y: pos.y,
                        number: step.next_callout_number(),
                    }),
                };
            }
            Tool::Cursor => {
                self.mode = Mode::Idle;
                return EditorAction::Add { color, shape: Shape::Cursor(pos) };
            }
            Tool::Arrow => Shape::Arrow(Arrow { x: pos.x, y: pos.y, end_x: None, end_y: None }),
            Tool::Box => Shape::Box(Region { x: pos.x, y: pos.y, width: 0.0, height: 0.0 }),
            Tool::Circle => Shape::Circle(Region { x: pos.x, y: pos.y, width: 0.0, height: 0.0 }),
            Tool::Highlight => Shape::Highlight(Region { x: pos.x, y: pos.y, width: 0.0, height: 0.0 }),
            Tool::Blur => Shape::Blur(Region { x: pos.x, y: pos.y, width: 0.0, height: 0.0 }),
        };

        self.mode = Mode::Drawing(Draft { start: pos, shape });
        EditorAction::None
    }

    /// Pointer moved to `pos`.
    pub fn pointer_move(&mut self, step: &Step, pos: Point) -> EditorAction {
        match &mut self.mode {
            Mode::Drawing(draft) => {
                let delta = draft.start.offset_to(pos);
                match &mut draft.shape {
                    Shape::Arrow(arrow) => {
                        arrow.end_x = Some(pos.x);
                        arrow.end_y = Some(pos.y);
                    }
                    Shape::Box(r) | Shape::Circle(r) | Shape::Highlight(r) | Shape::Blur(r) => {
                        r.width = delta.x;
                        r.height = delta.y;
                    }
                    Shape::Text(_) | Shape::Callout(_) | Shape::Cursor(_) => {}
                }
                EditorAction::None
            }
            Mode::Dragging { id, offset } => {
                let Some(annotation) = step.annotation(*id) else {
                    self.mode = Mode::Idle;
                    return EditorAction::None;
                };
                let mut shape = annotation.shape.clone();
                shape.move_anchor(Point::new(pos.x - offset.x, pos.y - offset.y));
                EditorAction::Move { id: *id, shape }
            }
            Mode::Idle | Mode::PendingText { .. } => EditorAction::None,
        }
    }

    /// Pointer released (or left the canvas).
    pub fn pointer_up(&mut self) -> EditorAction {
        match std::mem::replace(&mut self.mode, Mode::Idle) {
            Mode::Drawing(draft) => {
                if draft.has_size() {
                    EditorAction::Add { color: self.color.clone(), shape: draft.shape }
                } else {
                    log::debug!("Discarding {:?} draft without size", draft.shape.kind());
                    EditorAction::None
                }
            }
            Mode::Dragging { id, .. } => {
                log::debug!("Finished dragging annotation {:?}", id);
                EditorAction::None
            }
            pending @ Mode::PendingText { .. } => {
                self.mode = pending;
                EditorAction::None
            }
            Mode::Idle => EditorAction::None,
        }
    }

    /// Finish the text prompt. Empty or missing text creates nothing.
    pub fn submit_text(&mut self, text: Option<String>) -> EditorAction {
        let Mode::PendingText { at } = self.mode else {
            return EditorAction::None;
        };
        self.mode = Mode::Idle;

        match text {
            Some(text) if !text.is_empty() => EditorAction::Add {
                color: self.color.clone(),
                shape: Shape::Text(TextLabel {
                    x: at.x,
                    y: at.y,
                    text,
                    font_size: Some(DEFAULT_FONT_SIZE),
                }),
            },
            _ => EditorAction::None,
        }
    }

    /// Handle a key press. Ignored while a text field has keyboard focus.
    pub fn key(&mut self, key: EditorKey, text_input_focused: bool) -> EditorAction {
        if text_input_focused {
            return EditorAction::None;
        }

        match key {
            EditorKey::Delete | EditorKey::Backspace => match self.selected.take() {
                Some(id) => EditorAction::Delete(id),
                None => EditorAction::None,
            },
            EditorKey::Escape => {
                self.selected = None;
                self.set_tool(Tool::Select);
                EditorAction::None
            }
            EditorKey::Char(c) => {
                if let Some(tool) = Tool::from_shortcut(c) {
                    self.set_tool(tool);
                } else {
                    match c {
                        '+' | '=' => self.zoom.zoom_in(),
                        '-' => self.zoom.zoom_out(),
                        '0' => self.zoom.reset(),
                        _ => {}
                    }
                }
                EditorAction::None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::Annotation;

    fn step() -> Step {
        Step::new(0, String::new(), String::new())
    }

    /// Apply an action the way the app does.
    fn apply(step: &mut Step, action: EditorAction) {
        match action {
            EditorAction::Add { color, shape } => step.annotations.push(Annotation::new(color, shape)),
            EditorAction::Move { id, shape } => {
                if let Some(a) = step.annotation_mut(id) {
                    a.shape = shape;
                }
            }
            EditorAction::Delete(id) => step.annotations.retain(|a| a.id != id),
            EditorAction::None => {}
        }
    }

    fn drag(editor: &mut AnnotationEditor, step: &mut Step, from: Point, to: Point) {
        let action = editor.pointer_down(step, from, None);
        apply(step, action);
        let action = editor.pointer_move(step, to);
        apply(step, action);
        let action = editor.pointer_up();
        apply(step, action);
    }

    #[test]
    fn test_box_drag_commits_with_active_color() {
        let mut editor = AnnotationEditor::new();
        let mut step = step();
        editor.set_tool(Tool::Box);
        editor.set_color("#10B981");
        drag(&mut editor, &mut step, Point::new(50.0, 50.0), Point::new(30.0, 40.0));

        assert_eq!(step.annotations.len(), 1);
        let annotation = &step.annotations[0];
        assert_eq!(annotation.color, "#10B981");
        let region = annotation.shape.region().unwrap();
        assert_eq!((region.width, region.height), (-20.0, -10.0));
        assert_eq!(editor.mode(), &Mode::Idle);
    }

    #[test]
    fn test_tiny_drafts_are_discarded() {
        let mut editor = AnnotationEditor::new();
        let mut step = step();
        for tool in [Tool::Box, Tool::Circle, Tool::Highlight, Tool::Blur] {
            editor.set_tool(tool);
            drag(&mut editor, &mut step, Point::new(10.0, 10.0), Point::new(11.0, 9.0));
        }
        assert!(step.annotations.is_empty());

        // Just over the threshold on one axis is enough.
        editor.set_tool(Tool::Highlight);
        drag(&mut editor, &mut step, Point::new(10.0, 10.0), Point::new(11.5, 10.0));
        assert_eq!(step.annotations.len(), 1);
    }

    #[test]
    fn test_arrow_needs_an_end_point() {
        let mut editor = AnnotationEditor::new();
        let mut step = step();
        editor.set_tool(Tool::Arrow);

        let action = editor.pointer_down(&step, Point::new(10.0, 10.0), None);
        assert_eq!(action, EditorAction::None);
        assert_eq!(editor.pointer_up(), EditorAction::None);

        // Any move sets the end, even back onto the start.
        drag(&mut editor, &mut step, Point::new(10.0, 10.0), Point::new(10.0, 10.0));
        assert_eq!(step.annotations.len(), 1);
        assert_eq!(step.annotations[0].kind(), crate::models::annotation::AnnotationKind::Arrow);
    }

    #[test]
    fn test_callouts_number_from_existing_count() {
        let mut editor = AnnotationEditor::new();
        let mut step = step();
        editor.set_tool(Tool::Callout);
        for i in 0..3 {
            let action = editor.pointer_down(&step, Point::new(i as f64 * 10.0, 5.0), None);
            apply(&mut step, action);
            assert!(editor.draft().is_none());
        }
        assert_eq!(step.callout_numbers(), vec![1, 2, 3]);

        let second = step.annotations[1].id;
        step.annotations.retain(|a| a.id != second);
        let action = editor.pointer_down(&step, Point::new(50.0, 50.0), None);
        apply(&mut step, action);
        assert_eq!(step.callout_numbers(), vec![1, 3, 3]);
    }

    #[test]
    fn test_cursor_places_on_click() {
        let mut editor = AnnotationEditor::new();
        let step = step();
        editor.set_tool(Tool::Cursor);
        let action = editor.pointer_down(&step, Point::new(12.0, 34.0), None);
        assert!(matches!(action, EditorAction::Add { shape: Shape::Cursor(p), .. } if p == Point::new(12.0, 34.0)));
        assert_eq!(editor.mode(), &Mode::Idle);
    }

    #[test]
    fn test_text_requires_non_empty_input() {
        let mut editor = AnnotationEditor::new();
        let step = step();
        editor.set_tool(Tool::Text);

        editor.pointer_down(&step, Point::new(20.0, 20.0), None);
        assert_eq!(editor.mode(), &Mode::PendingText { at: Point::new(20.0, 20.0) });
        assert_eq!(editor.submit_text(Some(String::new())), EditorAction::None);

        editor.pointer_down(&step, Point::new(20.0, 20.0), None);
        assert_eq!(editor.submit_text(None), EditorAction::None);

        editor.pointer_down(&step, Point::new(20.0, 20.0), None);
        match editor.submit_text(Some("Click Save".into())) {
            EditorAction::Add { shape: Shape::Text(label), .. } => {
                assert_eq!(label.text, "Click Save");
                assert_eq!(label.font_size(), DEFAULT_FONT_SIZE);
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_select_drag_keeps_pointer_offset() {
        let mut editor = AnnotationEditor::new();
        let mut step = step();
        step.annotations.push(Annotation::new(
            "#000000",
            Shape::Box(Region { x: 10.0, y: 10.0, width: 20.0, height: 20.0 }),
        ));
        let id = step.annotations[0].id;

        editor.pointer_down(&step, Point::new(15.0, 12.0), Some(id));
        assert_eq!(editor.selected(), Some(id));
        assert!(matches!(editor.mode(), Mode::Dragging { .. }));

        let action = editor.pointer_move(&step, Point::new(25.0, 22.0));
        apply(&mut step, action);
        let anchor = step.annotations[0].shape.anchor();
        assert_eq!((anchor.x, anchor.y), (20.0, 20.0));

        assert_eq!(editor.pointer_up(), EditorAction::None);
        assert_eq!(editor.mode(), &Mode::Idle);
        assert_eq!(editor.tool(), Tool::Select);
    }

    #[test]
    fn test_click_on_empty_canvas_clears_selection() {
        let mut editor = AnnotationEditor::new();
        let step = step();
        editor.select(Some(AnnotationId::new()));
        editor.pointer_down(&step, Point::new(1.0, 1.0), None);
        assert_eq!(editor.selected(), None);
    }

    #[test]
    fn test_drawing_tools_ignore_hits() {
        let mut editor = AnnotationEditor::new();
        let mut step = step();
        step.annotations.push(Annotation::new("#000000", Shape::Cursor(Point::new(5.0, 5.0))));
        let id = step.annotations[0].id;
        editor.set_tool(Tool::Box);
        editor.pointer_down(&step, Point::new(5.0, 5.0), Some(id));
        assert!(editor.draft().is_some());
        assert_eq!(editor.selected(), None);
    }

    #[test]
    fn test_keyboard_shortcuts() {
        let mut editor = AnnotationEditor::new();
        for tool in Tool::ALL {
            editor.key(EditorKey::Char(tool.shortcut().to_ascii_uppercase()), false);
            assert_eq!(editor.tool(), tool);
        }

        editor.key(EditorKey::Char('r'), true);
        assert_eq!(editor.tool(), Tool::Blur, "shortcuts are ignored while typing");

        let id = AnnotationId::new();
        editor.select(Some(id));
        assert_eq!(editor.key(EditorKey::Backspace, false), EditorAction::Delete(id));
        assert_eq!(editor.selected(), None);
        assert_eq!(editor.key(EditorKey::Delete, false), EditorAction::None);

        editor.select(Some(id));
        editor.key(EditorKey::Escape, false);
        assert_eq!(editor.selected(), None);
        assert_eq!(editor.tool(), Tool::Select);
    }

    #[test]
    fn test_zoom_keys_and_wheel_clamp() {
        let mut editor = AnnotationEditor::new();
        for _ in 0..20 {
            editor.key(EditorKey::Char('+'), false);
        }
        assert_eq!(editor.zoom().factor(), ZOOM_MAX);

        editor.key(EditorKey::Char('0'), false);
        assert_eq!(editor.zoom().factor(), 1.0);
        editor.key(EditorKey::Char('-'), false);
        assert_eq!(editor.zoom().factor(), 0.75);

        for _ in 0..10 {
            editor.zoom_mut().wheel(-1.0);
        }
        assert_eq!(editor.zoom().factor(), ZOOM_MIN);
        editor.zoom_mut().wheel(1.0);
        assert_eq!(editor.zoom().factor(), 0.6);
    }

    #[test]
    fn test_switching_tool_drops_draft() {
        let mut editor = AnnotationEditor::new();
        let step = step();
        editor.set_tool(Tool::Circle);
        editor.pointer_down(&step, Point::new(0.0, 0.0), None);
        editor.pointer_move(&step, Point::new(50.0, 50.0));
        editor.set_tool(Tool::Box);
        assert_eq!(editor.draft(), None);
        assert_eq!(editor.pointer_up(), EditorAction::None);
    }
}
