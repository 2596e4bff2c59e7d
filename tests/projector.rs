use projector_dom::{
	h,
	memory::{MemoryDocument, NodeId},
	Error, Handler, ManualScheduler, ProjectionId, Projector, ProjectorOptions, ProjectorState, Properties, VNode,
};
use std::{
	cell::{Cell, RefCell},
	rc::Rc,
};

fn setup() -> (MemoryDocument, NodeId, Rc<ManualScheduler>) {
	let _ = tracing_subscriber::fmt().with_max_level(tracing::Level::TRACE).with_test_writer().try_init();
	let document = MemoryDocument::new();
	let root = document.create_root("body");
	(document, root, Rc::new(ManualScheduler::new()))
}

/// A render function that counts its invocations.
fn counting(renders: &Rc<Cell<usize>>) -> impl FnMut() -> VNode<MemoryDocument> + 'static {
	let renders = Rc::clone(renders);
	move || {
		renders.set(renders.get() + 1);
		h!("p", [renders.get()])
	}
}

#[test]
fn render_requests_are_coalesced() {
	let (document, root, scheduler) = setup();
	let projector = Projector::new(document.clone(), scheduler.clone());
	let renders = Rc::new(Cell::new(0));
	projector.append(&root, counting(&renders)).unwrap();
	assert_eq!(renders.get(), 1);
	assert_eq!(projector.state(), ProjectorState::Idle);

	for _ in 0..10 {
		projector.schedule_render();
	}
	assert_eq!(projector.state(), ProjectorState::Scheduled);
	assert_eq!(scheduler.requested(), 1);

	assert_eq!(scheduler.run_frame(), 1);
	assert_eq!(renders.get(), 2);
	assert_eq!(projector.state(), ProjectorState::Idle);
	assert_eq!(document.text_content(root), "2");
}

#[test]
fn handlers_trigger_a_render() {
	let (document, root, scheduler) = setup();
	let projector = Projector::new(document.clone(), scheduler.clone());

	let clicks = Rc::new(Cell::new(0));
	let onclick = Handler::<MemoryDocument>::new({
		let clicks = Rc::clone(&clicks);
		move |_| clicks.set(clicks.get() + 1)
	});
	let id = {
		let clicks = Rc::clone(&clicks);
		projector
			.append(&root, move || h!("button", Properties::new().on("onclick", &onclick), [format!("Clicked {} times", clicks.get())]))
			.unwrap()
	};
	let button = document.children(root)[0];
	assert_eq!(document.text_content(button), "Clicked 0 times");

	assert!(document.dispatch(button, "onclick"));
	assert_eq!(clicks.get(), 1);
	assert_eq!(projector.state(), ProjectorState::Scheduled);

	scheduler.run_frame();
	assert_eq!(document.text_content(button), "Clicked 1 times");

	// Detached projections keep their handlers, but no render is attached to them anymore.
	let projection = projector.detach(id).unwrap();
	assert_eq!(*projection.dom_node(), button);
	assert!(projector.is_empty());
	assert!(document.dispatch(button, "onclick"));
	scheduler.run_frame();
	assert_eq!(document.text_content(button), "Clicked 1 times");
	assert!(projector.detach(id).is_none());
}

#[test]
fn failed_pass_suspends_rendering_until_resumed() {
	let (document, root, scheduler) = setup();
	let errors = Rc::new(RefCell::new(Vec::new()));
	let projector = Projector::with_options(
		document.clone(),
		scheduler.clone(),
		ProjectorOptions::new().on_error({
			let errors = Rc::clone(&errors);
			move |error: &Error| errors.borrow_mut().push(error.clone())
		}),
	);

	let broken = Rc::new(Cell::new(false));
	{
		let broken = Rc::clone(&broken);
		projector.append(&root, move || if broken.get() { h!("span") } else { h!("div") }).unwrap();
	}

	broken.set(true);
	projector.schedule_render();
	scheduler.run_frame();
	assert_eq!(projector.state(), ProjectorState::Errored);
	assert_eq!(
		*errors.borrow(),
		vec![Error::RootSelectorChanged {
			previous: "div".to_string(),
			next: "span".to_string(),
		}]
	);

	projector.schedule_render();
	assert_eq!(scheduler.pending(), 0);
	assert_eq!(projector.render_now(), Ok(()));
	assert_eq!(errors.borrow().len(), 1);

	broken.set(false);
	projector.resume();
	assert_eq!(projector.state(), ProjectorState::Scheduled);
	scheduler.run_frame();
	assert_eq!(projector.state(), ProjectorState::Idle);
	assert_eq!(errors.borrow().len(), 1);
}

#[test]
fn render_now_reports_the_error() {
	let (document, root, scheduler) = setup();
	let projector = Projector::new(document, scheduler);
	let broken = Rc::new(Cell::new(false));
	{
		let broken = Rc::clone(&broken);
		projector.append(&root, move || h!(if broken.get() { "b" } else { "i" })).unwrap();
	}

	broken.set(true);
	assert!(matches!(projector.render_now(), Err(Error::RootSelectorChanged { .. })));
	assert_eq!(projector.state(), ProjectorState::Errored);
}

#[test]
fn stop_and_resume() {
	let (document, root, scheduler) = setup();
	let projector = Projector::new(document.clone(), scheduler.clone());
	let renders = Rc::new(Cell::new(0));
	projector.append(&root, counting(&renders)).unwrap();

	projector.schedule_render();
	projector.stop();
	assert_eq!(projector.state(), ProjectorState::Stopped);
	assert_eq!(scheduler.pending(), 0);

	projector.schedule_render();
	assert_eq!(scheduler.pending(), 0);
	assert_eq!(scheduler.run_frame(), 0);
	assert_eq!(renders.get(), 1);

	// Explicit renders still happen while stopped.
	projector.render_now().unwrap();
	assert_eq!(renders.get(), 2);
	assert_eq!(projector.state(), ProjectorState::Stopped);

	projector.resume();
	assert_eq!(projector.state(), ProjectorState::Scheduled);
	scheduler.run_frame();
	assert_eq!(renders.get(), 3);
	assert_eq!(document.text_content(root), "3");
}

#[test]
fn render_now_cancels_the_pending_frame() {
	let (document, root, scheduler) = setup();
	let projector = Projector::new(document, scheduler.clone());
	let renders = Rc::new(Cell::new(0));
	projector.append(&root, counting(&renders)).unwrap();

	projector.schedule_render();
	projector.render_now().unwrap();
	assert_eq!(renders.get(), 2);
	assert_eq!(scheduler.pending(), 0);
	assert_eq!(projector.state(), ProjectorState::Idle);
}

#[test]
fn requests_during_a_pass_are_coalesced_into_it() {
	let (document, root, scheduler) = setup();
	let projector = Projector::new(document, scheduler.clone());
	let renders = Rc::new(Cell::new(0));
	{
		let projector = projector.clone();
		let mut render = counting(&renders);
		projector.clone().append(&root, move || {
			projector.schedule_render();
			render()
		})
		.unwrap();
	}
	// The initial render happens outside of a pass.
	assert_eq!(scheduler.requested(), 1);

	scheduler.run_frame();
	assert_eq!(renders.get(), 2);
	assert_eq!(scheduler.requested(), 1);
	assert_eq!(projector.state(), ProjectorState::Idle);
}

#[test]
fn all_projections_render_in_one_pass() {
	let (document, root, scheduler) = setup();
	let projector = Projector::new(document.clone(), scheduler.clone());
	let first = Rc::new(Cell::new(0));
	let second = Rc::new(Cell::new(0));

	let anchor = document.create_root("hr");
	projector.append(&root, || h!("hr")).unwrap();
	let hr = document.children(root)[0];
	projector.insert_before(&hr, counting(&first)).unwrap();
	projector.replace(&hr, counting(&second)).unwrap();
	projector.merge(&anchor, || h!("hr", Properties::new().set("title", "merged"))).unwrap();
	assert_eq!(projector.len(), 4);
	assert_eq!(document.children(root).len(), 2);
	assert_eq!(document.attribute(anchor, "title").as_deref(), Some("merged"));

	projector.schedule_render();
	scheduler.run_frame();
	assert_eq!((first.get(), second.get()), (2, 2));
	assert_eq!(document.text_content(root), "22");
}

#[test]
fn projections_can_detach_themselves_while_updating() {
	let (document, root, scheduler) = setup();
	let projector = Projector::new(document.clone(), scheduler.clone());
	let renders = Rc::new(Cell::new(0));
	let own_id = Rc::new(Cell::new(None::<ProjectionId>));
	let handed_back = Rc::new(Cell::new(None::<bool>));

	let id = {
		let projector = projector.clone();
		let renders = Rc::clone(&renders);
		let own_id = Rc::clone(&own_id);
		let handed_back = Rc::clone(&handed_back);
		projector.clone().append(&root, move || {
			renders.set(renders.get() + 1);
			let projector = projector.clone();
			let own_id = Rc::clone(&own_id);
			let handed_back = Rc::clone(&handed_back);
			h!("p", Properties::new().after_update(move |_| {
				if let Some(id) = own_id.get() {
					handed_back.set(Some(projector.detach(id).is_some()));
				}
			}), [renders.get()])
		})
		.unwrap()
	};
	own_id.set(Some(id));

	projector.schedule_render();
	scheduler.run_frame();
	assert_eq!(handed_back.get(), Some(false));
	assert!(projector.is_empty());
	assert_eq!(projector.state(), ProjectorState::Idle);
	assert_eq!(document.text_content(root), "2");

	projector.schedule_render();
	scheduler.run_frame();
	assert_eq!(renders.get(), 2);
	assert!(projector.detach(id).is_none());
}
