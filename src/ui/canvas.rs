// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing canvas for the selected step.
//!
//! Shows the screenshot at the editor's zoom, paints every annotation from
//! its geometry primitive, and feeds raw pointer input to the
//! [`AnnotationEditor`]. The resulting actions go back to the app.

use crate::editor::{AnnotationEditor, EditorAction, Mode, Tool};
use crate::models::annotation::Annotation;
use crate::models::project::Step;
use crate::util::color::Rgba;
use crate::util::geometry::{self, Frame, PixelPoint, Primitive};

/// Selection outline color.
const SELECTION: egui::Color32 = egui::Color32::from_rgb(0x3B, 0x82, 0xF6);

const ELLIPSE_SEGMENTS: usize = 64;

fn color32(color: Rgba) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

fn pos(p: PixelPoint) -> egui::Pos2 {
    egui::pos2(p.x, p.y)
}

fn rect(r: &geometry::PixelRect) -> egui::Rect {
    egui::Rect::from_min_size(egui::pos2(r.x, r.y), egui::vec2(r.width, r.height))
}

/// Decode status of the step's screenshot.
pub enum Screenshot<'a> {
    Loading,
    Ready(&'a (egui::TextureHandle, [u32; 2])),
    Unreadable,
}

/// Display the canvas for `step` and return what the pointer did.
pub fn show(ui: &mut egui::Ui, step: &Step, screenshot: Screenshot, editor: &mut AnnotationEditor) -> Vec<EditorAction> {
    let mut actions = Vec::new();
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);

    let (texture, [img_width, img_height]) = match screenshot {
        Screenshot::Ready(texture) => texture,
        Screenshot::Loading => {
            ui.centered_and_justified(|ui| {
                ui.spinner();
            });
            return actions;
        }
        Screenshot::Unreadable => {
            ui.centered_and_justified(|ui| {
                ui.label(egui::RichText::new(format!("Can't display {}", step.image_name)).weak());
            });
            return actions;
        }
    };

    let zoom = editor.zoom().factor();
    let available = ui.available_width().max(100.0);
    let base_width = (*img_width as f32).min(available - 16.0).max(1.0);
    let display = egui::vec2(base_width * zoom, base_width * zoom * *img_height as f32 / *img_width as f32);

    egui::ScrollArea::both().auto_shrink([false, false]).show(ui, |ui| {
        let (image_rect, response) = ui.allocate_exact_size(display, egui::Sense::click_and_drag());

        let cursor = if editor.tool() == Tool::Select {
            egui::CursorIcon::Default
        } else {
            egui::CursorIcon::Crosshair
        };
        if response.hovered() {
            ui.ctx().set_cursor_icon(cursor);
        }

        let painter = ui.painter_at(image_rect);
        painter.image(
            texture.id(),
            image_rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );

        let frame = Frame::new(
            PixelPoint::new(image_rect.min.x, image_rect.min.y),
            image_rect.width(),
            image_rect.height(),
            zoom,
        );

        actions = handle_pointer(ui, &response, image_rect, &frame, step, editor);

        for annotation in &step.annotations {
            let primitive = geometry::layout(annotation, &frame);
            draw_primitive(&painter, &primitive);
            if editor.selected() == Some(annotation.id) {
                let bounds = rect(&primitive.bounds()).expand(3.0 * zoom);
                painter.rect_stroke(bounds, 2.0, egui::Stroke::new(2.0, SELECTION));
            }
        }

        if let Some(draft) = editor.draft() {
            let preview = Annotation::preview(editor.color(), draft.shape.clone());
            draw_primitive(&painter, &geometry::layout(&preview, &frame));
        }
    });

    actions
}

fn handle_pointer(
    ui: &egui::Ui,
    response: &egui::Response,
    image_rect: egui::Rect,
    frame: &Frame,
    step: &Step,
    editor: &mut AnnotationEditor,
) -> Vec<EditorAction> {
    let mut actions = Vec::new();
    let (pressed, released, moved, pointer, zoom_delta) = ui.input(|i| {
        (
            i.pointer.primary_pressed(),
            i.pointer.primary_released(),
            i.pointer.delta() != egui::Vec2::ZERO,
            i.pointer.hover_pos(),
            i.zoom_delta(),
        )
    });

    // Ctrl/Cmd + scroll
    if response.hovered() && zoom_delta != 1.0 {
        editor.zoom_mut().wheel(zoom_delta - 1.0);
    }

    let inside = pointer.filter(|p| image_rect.contains(*p));
    let to_percent = |p: egui::Pos2| frame.to_percent(PixelPoint::new(p.x, p.y));

    if pressed {
        if let Some(p) = inside {
            let hit = geometry::hit_test(&step.annotations, frame, PixelPoint::new(p.x, p.y));
            actions.push(editor.pointer_down(step, to_percent(p), hit));
        }
    }

    let active = matches!(editor.mode(), Mode::Drawing(_) | Mode::Dragging { .. });
    if active {
        match inside {
            Some(p) if moved => actions.push(editor.pointer_move(step, to_percent(p))),
            Some(_) => {}
            // Leaving the canvas ends the gesture.
            None => actions.push(editor.pointer_up()),
        }
    }

    if released {
        actions.push(editor.pointer_up());
    }

    actions.retain(|a| *a != EditorAction::None);
    actions
}

/// Paint one primitive with egui.
pub fn draw_primitive(painter: &egui::Painter, primitive: &Primitive) {
    match primitive {
        Primitive::Outline { rect: r, radius, stroke, color } => {
            let centre = rect(&Primitive::stroke_rect(r, *stroke));
            painter.rect_stroke(centre, (radius - stroke / 2.0).max(0.0), egui::Stroke::new(*stroke, color32(*color)));
        }
        Primitive::Ellipse { rect: r, stroke, color } => {
            let points = geometry::ellipse_points(&Primitive::stroke_rect(r, *stroke), ELLIPSE_SEGMENTS)
                .into_iter()
                .map(pos)
                .collect();
            painter.add(egui::Shape::closed_line(points, egui::Stroke::new(*stroke, color32(*color))));
        }
        Primitive::Fill { rect: r, radius, color } => {
            painter.rect_filled(rect(r), *radius, color32(*color));
        }
        Primitive::Arrow { shaft, head, color } => {
            let fill = color32(*color);
            painter.add(egui::Shape::convex_polygon(shaft.iter().copied().map(pos).collect(), fill, egui::Stroke::NONE));
            painter.add(egui::Shape::convex_polygon(head.iter().copied().map(pos).collect(), fill, egui::Stroke::NONE));
        }
        Primitive::Label(label) => {
            let font = egui::FontId::proportional(label.size);
            let origin = pos(label.origin);
            painter.text(
                origin + egui::vec2(1.0, 1.0),
                egui::Align2::LEFT_TOP,
                &label.text,
                font.clone(),
                egui::Color32::from_black_alpha(128),
            );
            painter.text(origin, egui::Align2::LEFT_TOP, &label.text, font, color32(label.color));
        }
        Primitive::Badge { center, radius, number, text_size, fill } => {
            let c = pos(*center);
            painter.circle_filled(c + egui::vec2(0.0, 2.0), *radius, egui::Color32::from_black_alpha(76));
            painter.circle_filled(c, *radius, color32(*fill));
            if let Some(n) = number {
                painter.text(
                    c,
                    egui::Align2::CENTER_CENTER,
                    n.to_string(),
                    egui::FontId::proportional(*text_size),
                    egui::Color32::WHITE,
                );
            }
        }
        Primitive::Cursor { dot_center, dot_radius, ring_center, ring_radius, ring_stroke, color, ring_color } => {
            painter.circle_stroke(pos(*ring_center), *ring_radius, egui::Stroke::new(*ring_stroke, color32(*ring_color)));
            let c = pos(*dot_center);
            painter.circle_filled(c + egui::vec2(0.0, 2.0), *dot_radius, egui::Color32::from_black_alpha(76));
            painter.circle_filled(c, *dot_radius, color32(*color));
        }
    }
}
