use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::html::Canvas;
use leptos::prelude::*;
use log::error;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::engine::CanvasEngine;
use super::render;
use crate::topology::RendererEvent;

const FRAME_SECONDS: f32 = 0.016;

fn viewport_size(window: &Window) -> (f64, f64) {
	let dimension = |value: Result<JsValue, JsValue>, fallback: f64| {
		value.ok().and_then(|v| v.as_f64()).unwrap_or(fallback)
	};
	(
		dimension(window.inner_width(), 800.0),
		dimension(window.inner_height(), 600.0),
	)
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas.get_context("2d").ok().flatten()?.dyn_into().ok()
}

/// Pointer position relative to the canvas' top-left corner.
fn pointer(canvas_ref: NodeRef<Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?;
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Animation-frame and resize callbacks of one mounted canvas.
///
/// The frame callback reschedules itself through `animate`, so the loop only ends once
/// [`FrameLoop::stop`] empties the slot.
struct FrameLoop<F = Closure<dyn FnMut()>> {
	animate: Rc<RefCell<Option<F>>>,
	resize: Rc<RefCell<Option<F>>>,
	pending: Rc<Cell<Option<i32>>>,
}

impl<F> Default for FrameLoop<F> {
	fn default() -> Self {
		Self {
			animate: Rc::new(RefCell::new(None)),
			resize: Rc::new(RefCell::new(None)),
			pending: Rc::new(Cell::new(None)),
		}
	}
}

impl<F> Clone for FrameLoop<F> {
	fn clone(&self) -> Self {
		Self {
			animate: self.animate.clone(),
			resize: self.resize.clone(),
			pending: self.pending.clone(),
		}
	}
}

impl<F> FrameLoop<F> {
	/// Drop the frame callback and hand back what still has to be unregistered.
	fn detach(&self) -> (Option<i32>, Option<F>) {
		self.animate.borrow_mut().take();
		(self.pending.take(), self.resize.borrow_mut().take())
	}
}

impl FrameLoop {
	fn request(&self, window: &Window) {
		if let Some(cb) = self.animate.borrow().as_ref() {
			self.pending
				.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
		}
	}

	fn stop(&self) {
		let (pending, resize) = self.detach();
		if pending.is_none() && resize.is_none() {
			return;
		}
		let Some(window) = web_sys::window() else {
			return;
		};
		if let Some(id) = pending {
			let _ = window.cancel_animation_frame(id);
		}
		if let Some(cb) = resize {
			let _ = window.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}
	}
}

#[component]
pub fn ForceGraphCanvas(
	engine: CanvasEngine,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<Canvas>::new();
	let frames = StoredValue::new_local(<FrameLoop>::default());
	let engine_init = engine.clone();

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas;
		let Some(window) = web_sys::window() else {
			return;
		};
		let Some(frame_loop) = frames.try_get_value() else {
			return;
		};
		frame_loop.stop();

		let (w, h) = if fullscreen {
			viewport_size(&window)
		} else {
			let parent = canvas.parent_element();
			(
				width.unwrap_or_else(|| {
					parent.as_ref().map_or(800.0, |p| p.client_width() as f64)
				}),
				height.unwrap_or_else(|| {
					parent.as_ref().map_or(600.0, |p| p.client_height() as f64)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = context_2d(&canvas) else {
			error!("canvas has no 2d context");
			return;
		};
		engine_init.state().borrow_mut().resize(w, h);

		if fullscreen {
			let (engine_resize, canvas_resize) = (engine_init.clone(), canvas.clone());
			let on_resize: Closure<dyn FnMut()> = Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = viewport_size(&win);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				engine_resize.state().borrow_mut().resize(nw, nh);
			});
			let _ =
				window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref());
			*frame_loop.resize.borrow_mut() = Some(on_resize);
		}

		let (engine_anim, frame_inner) = (engine_init.clone(), frame_loop.clone());
		*frame_loop.animate.borrow_mut() = Some(Closure::new(move || {
			let settled = {
				let mut s = engine_anim.state().borrow_mut();
				let settled = s.tick(FRAME_SECONDS);
				render::render(&s, &ctx);
				settled
			};
			// The handler may command the engine, so the state borrow must be gone by now.
			if settled {
				engine_anim.emit(RendererEvent::Stabilized);
			}
			if let Some(win) = web_sys::window() {
				frame_inner.request(&win);
			}
		}));
		frame_loop.request(&window);
	});

	on_cleanup(move || {
		frames.try_with_value(|frame_loop| frame_loop.stop());
	});

	let engine_md = engine.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if let Some((x, y)) = pointer(canvas_ref, &ev) {
			engine_md.state().borrow_mut().press(x, y);
		}
	};

	let engine_mm = engine.clone();
	let on_mousemove = move |ev: MouseEvent| {
		if let Some((x, y)) = pointer(canvas_ref, &ev) {
			engine_mm.state().borrow_mut().drag_to(x, y);
		}
	};

	let engine_mu = engine.clone();
	let on_mouseup = move |_: MouseEvent| {
		engine_mu.state().borrow_mut().release();
	};

	let engine_ml = engine.clone();
	let on_mouseleave = move |_: MouseEvent| {
		engine_ml.state().borrow_mut().leave();
	};

	let engine_wh = engine.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		if let Some((x, y)) = pointer(canvas_ref, &ev) {
			engine_wh.state().borrow_mut().zoom_at(x, y, ev.delta_y());
		}
	};

	let engine_click = engine.clone();
	let on_click = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		let ids = {
			let s = engine_click.state().borrow();
			if s.click_suppressed() {
				return;
			}
			s.ids_at(x, y)
		};
		engine_click.emit(RendererEvent::Click(ids));
	};

	let engine_dbl = engine;
	let on_dblclick = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		let ids = engine_dbl.state().borrow().ids_at(x, y);
		engine_dbl.emit(RendererEvent::DoubleClick(ids));
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			on:click=on_click
			on:dblclick=on_dblclick
			style="display: block; cursor: grab;"
		/>
	}
}
