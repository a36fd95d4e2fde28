use std::collections::HashMap;
use std::f64::consts::PI;

use force_graph::DefaultNodeIdx;
use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::{ForceGraphState, NODE_RADIUS};
use super::types::EdgeInfo;
use crate::topology::NodeShape;

const BACKGROUND: &str = "#1a1a2e";
/// Canvas units per pixel of the styled edge width.
const EDGE_WIDTH_SCALE: f64 = 0.25;
/// Zoom level above which edge labels are drawn.
const EDGE_LABEL_ZOOM: f64 = 1.5;
const LINE_HEIGHT: f64 = 12.0;

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	let positions = state.node_positions();
	draw_edges(state, &positions, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn set_dash(ctx: &CanvasRenderingContext2d, dashed: bool, k: f64) {
	let pattern = if dashed {
		js_sys::Array::of2(&JsValue::from_f64(8.0 / k), &JsValue::from_f64(4.0 / k))
	} else {
		js_sys::Array::new()
	};
	let _ = ctx.set_line_dash(&pattern);
}

fn draw_edges(
	state: &ForceGraphState,
	positions: &HashMap<DefaultNodeIdx, (f64, f64)>,
	ctx: &CanvasRenderingContext2d,
) {
	let k = state.transform.k;
	let arrow_size = 10.0 / k.max(0.5);
	let t = ease_out_cubic(state.hover.highlight_t);
	let has_highlight = state.has_active_highlight();

	for edge in state.edges() {
		let (Some(&(x1, y1)), Some(&(x2, y2))) = (positions.get(&edge.from), positions.get(&edge.to))
		else {
			continue;
		};
		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = dx.hypot(dy);
		if dist < 0.001 {
			continue;
		}

		let lit = state.is_focused_edge(edge)
			|| (has_highlight && state.is_highlighted(edge.from) && state.is_highlighted(edge.to));
		let alpha = if lit {
			1.0
		} else if has_highlight {
			0.85 - 0.6 * t
		} else {
			0.85
		};

		ctx.set_global_alpha(alpha);
		ctx.set_stroke_style_str(edge.color);
		ctx.set_line_width(edge.width * EDGE_WIDTH_SCALE * if lit { 1.4 } else { 1.0 });
		set_dash(ctx, edge.dashes, k);

		let (ux, uy) = (dx / dist, dy / dist);
		let start_inset = if edge.arrow_from {
			NODE_RADIUS + arrow_size
		} else {
			NODE_RADIUS
		};
		ctx.begin_path();
		ctx.move_to(x1 + ux * start_inset, y1 + uy * start_inset);
		ctx.line_to(x2 - ux * NODE_RADIUS, y2 - uy * NODE_RADIUS);
		ctx.stroke();
		set_dash(ctx, false, k);

		if edge.arrow_from {
			draw_arrow_into_from(ctx, edge, (x1, y1), (ux, uy), arrow_size);
		}
		if k >= EDGE_LABEL_ZOOM {
			ctx.set_fill_style_str("rgba(255, 255, 255, 0.7)");
			ctx.set_font(&format!("{}px sans-serif", 9.0 / k.max(0.5)));
			let _ = ctx.fill_text(&edge.label, (x1 + x2) / 2.0 + 2.0, (y1 + y2) / 2.0 - 2.0);
		}
	}
	ctx.set_global_alpha(1.0);
}

/// Arrowhead whose tip touches the `from` node, pointing into it.
fn draw_arrow_into_from(
	ctx: &CanvasRenderingContext2d,
	edge: &EdgeInfo,
	(x1, y1): (f64, f64),
	(ux, uy): (f64, f64),
	size: f64,
) {
	let (tip_x, tip_y) = (x1 + ux * NODE_RADIUS, y1 + uy * NODE_RADIUS);
	let (back_x, back_y) = (tip_x + ux * size, tip_y + uy * size);
	let (px, py) = (-uy * size * 0.5, ux * size * 0.5);
	ctx.set_fill_style_str(edge.color);
	ctx.begin_path();
	ctx.move_to(tip_x, tip_y);
	ctx.line_to(back_x + px, back_y + py);
	ctx.line_to(back_x - px, back_y - py);
	ctx.close_path();
	ctx.fill();
}

fn trace_shape(ctx: &CanvasRenderingContext2d, shape: NodeShape, x: f64, y: f64, r: f64) {
	ctx.begin_path();
	match shape {
		NodeShape::Box => ctx.rect(x - 1.4 * r, y - r, 2.8 * r, 2.0 * r),
		NodeShape::Ellipse => {
			let _ = ctx.ellipse(x, y, 1.5 * r, r, 0.0, 0.0, 2.0 * PI);
		}
		NodeShape::Circle => {
			let _ = ctx.arc(x, y, r, 0.0, 2.0 * PI);
		}
	}
}

fn draw_nodes(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let (has_highlight, t, k) = (
		state.has_active_highlight(),
		ease_out_cubic(state.hover.highlight_t),
		state.transform.k,
	);
	let font = format!("{}px sans-serif", 10.0 / k.max(0.5));

	// Dimmed nodes first so highlighted ones paint over them.
	for pass_highlighted in [false, true] {
		state.graph.visit_nodes(|node| {
			let idx = node.index();
			let highlighted = has_highlight && state.is_highlighted(idx);
			if highlighted != pass_highlighted {
				return;
			}
			let info = &node.data.user_data;
			let (x, y) = (node.x() as f64, node.y() as f64);
			let selected = state.is_selected(idx);
			let hovered = state.is_hovered(idx);

			let radius = if hovered {
				NODE_RADIUS * (1.0 + 0.35 * t)
			} else {
				NODE_RADIUS
			};
			let alpha = if has_highlight && !highlighted && !selected {
				1.0 - 0.7 * t
			} else {
				1.0
			};

			if hovered && t > 0.01 {
				draw_glow(ctx, x, y, radius, t);
			}

			ctx.set_global_alpha(alpha);
			trace_shape(ctx, info.shape, x, y, radius);
			ctx.set_fill_style_str(info.color);
			ctx.fill();

			if selected {
				trace_shape(ctx, info.shape, x, y, radius + 3.0 / k);
				ctx.set_stroke_style_str("#ffffff");
				ctx.set_line_width(2.0 / k);
				ctx.stroke();
			}

			let lines = if highlighted || selected {
				&info.lines[..]
			} else {
				&info.lines[..info.lines.len().min(1)]
			};
			ctx.set_fill_style_str(&format!("rgba(255, 255, 255, {})", alpha * 0.85));
			ctx.set_font(&font);
			for (row, line) in lines.iter().enumerate() {
				let _ = ctx.fill_text(
					line,
					x + 1.5 * radius + 3.0,
					y + 3.0 + row as f64 * LINE_HEIGHT / k.max(0.5),
				);
			}
			ctx.set_global_alpha(1.0);
		});
	}
}

fn draw_glow(ctx: &CanvasRenderingContext2d, x: f64, y: f64, radius: f64, t: f64) {
	let glow_radius = NODE_RADIUS * (1.8 + 1.2 * t);
	let Ok(gradient) = ctx.create_radial_gradient(x, y, radius * 0.3, x, y, glow_radius) else {
		return;
	};
	let alpha = 0.35 * t;
	let _ = gradient.add_color_stop(0.0, &format!("rgba(255, 255, 255, {})", alpha));
	let _ = gradient.add_color_stop(0.6, &format!("rgba(200, 220, 255, {})", alpha * 0.3));
	let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
	ctx.begin_path();
	let _ = ctx.arc(x, y, glow_radius, 0.0, 2.0 * PI);
	#[allow(deprecated)]
	ctx.set_fill_style(&gradient);
	ctx.fill();
}
