use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;

use super::*;
use crate::error::Error;

fn animal() -> Arc<Class> {
	Class::builder("Animal")
		.method("legs", |_, _| Ok(Value::Int(4)))
		.method("sound", |_, _| Ok("...".into()))
		.build()
}

#[test]
fn isa_walks_ancestry() {
	let dog = Class::builder("Dog").parent(animal()).build();
	assert!(dog.isa("Dog"));
	assert!(dog.isa("Animal"));
	assert!(!dog.isa("Cat"));
}

#[test]
fn can_prefers_own_definition() {
	let dog = Class::builder("Dog")
		.parent(animal())
		.method("sound", |_, _| Ok("woof".into()))
		.build();
	let sound = dog.can("sound").expect("sound resolves");
	assert_eq!(sound.call(&Invocant::Class(dog.clone()), &[]).unwrap(), Value::from("woof"));
	assert!(dog.can("legs").is_some());
	assert!(dog.defines("sound"));
	assert!(!dog.defines("legs"));
	assert!(dog.can("fly").is_none());
}

#[test]
fn fallback_receives_method_name() {
	let echo = Class::builder("Echo")
		.fallback(|_, name, args| Ok(format!("{name}/{}", args.len()).into()))
		.build();
	assert!(echo.responds_to("anything"));
	assert!(echo.can("anything").is_none());
	assert_eq!(echo.invoke("ping", &[Value::Int(1)]).unwrap(), Value::from("ping/1"));
}

#[test]
fn unknown_method_names_class() {
	let plain = Class::builder("Plain").build();
	assert_eq!(
		plain.invoke("missing", &[]).unwrap_err(),
		Error::UnknownMethod {
			class: "Plain".into(),
			method: "missing".into(),
		}
	);
}

#[test]
fn instance_invoke_binds_object() {
	let counter = Class::builder("Counter")
		.method("bump", |inv, _| {
			let obj = inv.as_object().ok_or_else(|| Error::fault("needs instance"))?;
			let next = obj.get("n")?.and_then(|v| v.as_int()).unwrap_or(0) + 1;
			obj.insert("n", Value::Int(next))?;
			Ok(Value::Int(next))
		})
		.build();
	let obj = Instance::new(counter, Body::mapping([("n", 0_i64)]));
	assert_eq!(Instance::invoke(&obj, "bump", &[]).unwrap(), Value::Int(1));
	assert_eq!(Instance::invoke(&obj, "bump", &[]).unwrap(), Value::Int(2));
}

#[test]
fn body_reads_check_shape() {
	let obj = Instance::new(animal(), Body::sequence([1_i64, 2, 3]));
	assert_eq!(obj.element(1).unwrap(), Some(Value::Int(2)));
	assert_eq!(obj.element(9).unwrap(), None);
	assert_eq!(
		obj.get("x").unwrap_err(),
		Error::ShapeMismatch {
			expected: Shape::Mapping,
			found: Shape::Sequence,
		}
	);
}

#[test]
fn apply_calls_scalar_callable() {
	let code = Method::new("code", |_, args| Ok(Value::Int(args.len() as i64)));
	let obj = Instance::new(animal(), Body::Scalar(Value::Method(code)));
	assert_eq!(Instance::apply(&obj, &[Value::Undef, Value::Undef]).unwrap(), Value::Int(2));

	let inert = Instance::new(animal(), Body::Scalar(Value::Int(1)));
	assert!(matches!(Instance::apply(&inert, &[]), Err(Error::Fault(_))));
}

#[test]
fn class_table_runs_loader_once() {
	let runs = Arc::new(AtomicUsize::new(0));
	let table = ClassTable::new();
	let counted = runs.clone();
	table.register_loader("zoo", move || {
		counted.fetch_add(1, Ordering::SeqCst);
		vec![animal()]
	});

	assert!(table.resolve("Animal", None).is_none());
	assert!(table.resolve("Animal", Some("zoo")).is_some());
	assert!(table.resolve("Animal", Some("zoo")).is_some());
	assert!(table.resolve("Plant", Some("zoo")).is_none());
	assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn concurrent_lookups_wait_for_module_loader() {
	let runs = Arc::new(AtomicUsize::new(0));
	let table = ClassTable::new();
	let counted = runs.clone();
	table.register_loader("garden", move || {
		counted.fetch_add(1, Ordering::SeqCst);
		std::thread::sleep(std::time::Duration::from_millis(50));
		vec![animal(), Class::builder("Plant").build()]
	});

	let start = std::sync::Barrier::new(2);
	let (fauna, flora) = std::thread::scope(|scope| {
		let fauna = scope.spawn(|| {
			start.wait();
			table.resolve("Animal", Some("garden"))
		});
		let flora = scope.spawn(|| {
			start.wait();
			table.resolve("Plant", Some("garden"))
		});
		(fauna.join(), flora.join())
	});

	assert!(fauna.unwrap().is_some());
	assert!(flora.unwrap().is_some());
	assert_eq!(runs.load(Ordering::SeqCst), 1);
}
