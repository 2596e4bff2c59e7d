#![cfg(target_arch = "wasm32")]

use projector_dom::{
	h,
	web::{AnimationFrameScheduler, WebDocument},
	Handler, Projector, ProjectorState, Properties,
};
use std::{cell::Cell, rc::Rc, sync::Once};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, HtmlBodyElement, HtmlElement, HtmlInputElement};

wasm_bindgen_test_configure!(run_in_browser);

static LOG: Once = Once::new();

fn body() -> web_sys::Node {
	LOG.call_once(tracing_wasm::set_as_global_default);
	window().unwrap().document().unwrap().body().unwrap().dyn_into::<HtmlBodyElement>().unwrap().into()
}

#[wasm_bindgen_test]
fn click() {
	let body = body();
	let projector = Projector::new(WebDocument::from_window(), Rc::new(AnimationFrameScheduler::from_window()));

	let click_count = Rc::new(Cell::new(0));
	let onclick = Handler::<WebDocument>::new({
		let click_count = Rc::clone(&click_count);
		move |event| {
			event.dyn_ref::<web_sys::Event>().expect("Expected Event but received something else.");
			click_count.set(click_count.get() + 1)
		}
	});

	projector
		.append(&body, {
			let click_count = Rc::clone(&click_count);
			move || h!("button#test-button", Properties::new().on("onclick", &onclick), [format!("Clicked {} times", click_count.get())])
		})
		.unwrap();

	assert_eq!(click_count.get(), 0);
	let button: HtmlElement = window().unwrap().document().unwrap().get_element_by_id("test-button").unwrap().dyn_into().unwrap();
	button.click();
	assert_eq!(click_count.get(), 1);

	// Handlers installed through a projector request a render.
	assert_eq!(projector.state(), ProjectorState::Scheduled);
	projector.render_now().unwrap();
	assert_eq!(button.text_content().as_deref(), Some("Clicked 1 times"));
	assert_eq!(projector.state(), ProjectorState::Idle);
}

#[wasm_bindgen_test]
fn input_value_survives_lagging_render() {
	let body = body();
	let projector = Projector::new(WebDocument::from_window(), Rc::new(AnimationFrameScheduler::from_window()));

	let oninput = Handler::<WebDocument>::new(|_| ());
	projector
		.append(&body, move || h!("input#test-input", Properties::new().set("value", "initial").on("oninput", &oninput)))
		.unwrap();

	let input: HtmlInputElement = window().unwrap().document().unwrap().get_element_by_id("test-input").unwrap().dyn_into().unwrap();
	assert_eq!(input.value(), "initial");

	input.set_value("typed");
	input.dispatch_event(&web_sys::Event::new("input").unwrap()).unwrap();
	projector.render_now().unwrap();
	assert_eq!(input.value(), "typed");
}
