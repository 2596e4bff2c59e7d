#![cfg(target_arch = "wasm32")]

use projector_dom::{h, projection, web::WebDocument, ProjectionOptions, Properties, VNode, NAMESPACE_SVG};
use std::sync::Once;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, HtmlBodyElement};

wasm_bindgen_test_configure!(run_in_browser);

static LOG: Once = Once::new();

fn body() -> web_sys::Node {
	LOG.call_once(tracing_wasm::set_as_global_default);
	window().unwrap().document().unwrap().body().unwrap().dyn_into::<HtmlBodyElement>().unwrap().into()
}

#[wasm_bindgen_test]
fn text() {
	let body = body();
	let document = WebDocument::from_window();

	let vnode: VNode<WebDocument> = h!("p#create-text", ["Hello projector-dom!"]);
	let projection = projection::append(&document, &body, vnode, ProjectionOptions::new()).unwrap();

	let element = document.document().get_element_by_id("create-text").unwrap();
	assert_eq!(element.text_content().as_deref(), Some("Hello projector-dom!"));
	assert_eq!(projection.dom_node(), &web_sys::Node::from(element));
}

#[wasm_bindgen_test]
fn element() {
	let body = body();
	let document = WebDocument::from_window();

	let vnode = h!(
		"div.card#create-element",
		Properties::new().class("selected", true).style("color", "red").set("title", "A card"),
		[h!("span", ["one"]), h!("span", ["two"])]
	);
	projection::append(&document, &body, vnode, ProjectionOptions::new()).unwrap();

	let element = document.document().get_element_by_id("create-element").unwrap();
	assert!(element.class_list().contains("card"));
	assert!(element.class_list().contains("selected"));
	assert_eq!(element.get_attribute("title").as_deref(), Some("A card"));
	assert_eq!(element.dyn_ref::<web_sys::HtmlElement>().unwrap().style().get_property_value("color").unwrap(), "red");
	assert_eq!(element.child_element_count(), 2);
}

#[wasm_bindgen_test]
fn svg() {
	let body = body();
	let document = WebDocument::from_window();

	let vnode = h!("svg#create-svg", [h!("circle", Properties::new().set("r", "5"))]);
	projection::append(&document, &body, vnode, ProjectionOptions::new()).unwrap();

	let svg = document.document().get_element_by_id("create-svg").unwrap();
	assert_eq!(svg.namespace_uri().as_deref(), Some(NAMESPACE_SVG));
	let circle = svg.first_element_child().unwrap();
	assert_eq!(circle.namespace_uri().as_deref(), Some(NAMESPACE_SVG));
	assert_eq!(circle.get_attribute("r").as_deref(), Some("5"));
}
