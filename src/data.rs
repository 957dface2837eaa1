//! Element data (attributes, properties, styles, classes and event listeners) and its normalization.
//!
//! The diff core treats [`Data`] as an opaque key-value mapping and hands every changed entry to
//! [`Host::set_data`](`crate::Host::set_data`). Hosts that would rather deal in primitive operations
//! can forward to [`apply_data`], which splits composite values and classifies keys.

use core::{
	any::Any,
	fmt::{self, Debug, Formatter},
	hash::{Hash, Hasher},
};
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::trace;

/// The data mapping of an element or the props of a component.
pub type Data = HashMap<String, Value>;

/// XLink namespace, used for `xlink:`-prefixed attributes in SVG context.
pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";

/// A single data value.
///
/// Numbers compare by their bits, so `NaN` equals itself and `-0.0` differs from `0.0` (they render differently).
#[derive(Debug, Clone)]
pub enum Value {
	Text(String),
	Bool(bool),
	Number(f64),
	/// Class list, written as one space-separated `class` attribute.
	Class(Vec<String>),
	/// Style declarations, applied (and removed) individually.
	Style(Vec<(String, String)>),
	Listener(Callback),
}

impl Value {
	/// The attribute or property text of this value, if it has one.
	#[must_use]
	pub fn to_text(&self) -> Option<String> {
		match self {
			Value::Text(text) => Some(text.clone()),
			Value::Bool(true) => Some(String::new()),
			Value::Bool(false) | Value::Listener(_) => None,
			Value::Number(number) => Some(number.to_string()),
			Value::Class(classes) => Some(classes.join(" ")),
			Value::Style(declarations) => Some(declarations.iter().map(|(name, value)| format!("{}: {};", name, value)).collect::<Vec<_>>().join(" ")),
		}
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Value::Text(a), Value::Text(b)) => a == b,
			(Value::Bool(a), Value::Bool(b)) => a == b,
			(Value::Number(a), Value::Number(b)) => a.to_bits() == b.to_bits(),
			(Value::Class(a), Value::Class(b)) => a == b,
			(Value::Style(a), Value::Style(b)) => a == b,
			(Value::Listener(a), Value::Listener(b)) => a == b,
			_ => false,
		}
	}
}

impl From<&str> for Value {
	fn from(text: &str) -> Self {
		Value::Text(text.to_owned())
	}
}
impl From<String> for Value {
	fn from(text: String) -> Self {
		Value::Text(text)
	}
}
impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Value::Bool(value)
	}
}
impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Value::Number(value)
	}
}
impl From<Callback> for Value {
	fn from(callback: Callback) -> Self {
		Value::Listener(callback)
	}
}

/// An event handler. Compared and hashed by identity.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn(&dyn Any)>);
impl Callback {
	pub fn new(handler: impl Fn(&dyn Any) + 'static) -> Self {
		Self(Rc::new(handler))
	}

	pub fn call(&self, event: &dyn Any) {
		(self.0)(event)
	}

	fn address(&self) -> *const u8 {
		Rc::as_ptr(&self.0).cast::<u8>()
	}
}
impl PartialEq for Callback {
	fn eq(&self, other: &Self) -> bool {
		self.address() == other.address()
	}
}
impl Eq for Callback {}
impl Hash for Callback {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.address().hash(state)
	}
}
impl Debug for Callback {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Callback").field(&self.address()).finish()
	}
}

/// Primitive data operations a host can implement to use [`apply_data`].
pub trait DataSink {
	type Handle;
	type Error;

	fn set_attribute(&mut self, element: &Self::Handle, namespace: Option<&'static str>, name: &str, value: &str) -> Result<(), Self::Error>;
	fn remove_attribute(&mut self, element: &Self::Handle, namespace: Option<&'static str>, name: &str) -> Result<(), Self::Error>;
	fn set_property(&mut self, element: &Self::Handle, name: &str, value: Option<&Value>) -> Result<(), Self::Error>;
	fn set_style(&mut self, element: &Self::Handle, name: &str, value: Option<&str>) -> Result<(), Self::Error>;
	fn add_listener(&mut self, element: &Self::Handle, event: &str, callback: &Callback) -> Result<(), Self::Error>;
	fn remove_listener(&mut self, element: &Self::Handle, event: &str, callback: &Callback) -> Result<(), Self::Error>;
}

/// How a data key is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyClass<'a> {
	Style,
	Class,
	/// Listener for the contained (lowercased, `on`-stripped) event name.
	Listener(&'a str),
	Property,
	Attribute,
}

/// Classifies `key` the way [`apply_data`] applies it to an element in (`svg`) or outside of SVG context.
///
/// SVG attributes are case-sensitive (`viewBox`) and their DOM properties are read-only, so in SVG context
/// only the fixed property list is applied as properties.
#[must_use]
pub fn classify_key(key: &str, svg: bool) -> KeyClass<'_> {
	match key {
		"style" => KeyClass::Style,
		"class" => KeyClass::Class,
		"value" | "checked" | "selected" | "muted" => KeyClass::Property,
		_ if key.len() > 2 && key.starts_with("on") => KeyClass::Listener(&key[2..]),
		_ if !svg && key.bytes().any(|b| b.is_ascii_uppercase()) => KeyClass::Property,
		_ => KeyClass::Attribute,
	}
}

/// Applies the transition of `key` from `previous` to `next` onto `element`.
///
/// `previous == None` is a first application and `next == None` removes the key.
///
/// # Errors
///
/// Errors from `sink` are returned unmodified. Processing of composite values stops at the first one.
pub fn apply_data<S: DataSink + ?Sized>(sink: &mut S, element: &S::Handle, key: &str, previous: Option<&Value>, next: Option<&Value>, svg: bool) -> Result<(), S::Error> {
	match classify_key(key, svg) {
		KeyClass::Style => {
			let previous = match previous {
				Some(Value::Style(declarations)) => declarations.as_slice(),
				_ => &[],
			};
			let next = match next {
				Some(Value::Style(declarations)) => declarations.as_slice(),
				_ => &[],
			};
			for (name, value) in next {
				if previous.iter().any(|(n, v)| n == name && v == value) {
					continue;
				}
				sink.set_style(element, name, Some(value))?;
			}
			for (name, _) in previous {
				if !next.iter().any(|(n, _)| n == name) {
					sink.set_style(element, name, None)?;
				}
			}
			Ok(())
		}

		KeyClass::Class => match next.and_then(Value::to_text) {
			Some(classes) => sink.set_attribute(element, None, "class", &classes),
			None => sink.remove_attribute(element, None, "class"),
		},

		KeyClass::Listener(event) => {
			let event = event.to_ascii_lowercase();
			if let Some(Value::Listener(callback)) = previous {
				sink.remove_listener(element, &event, callback)?;
			}
			if let Some(Value::Listener(callback)) = next {
				sink.add_listener(element, &event, callback)?;
			}
			Ok(())
		}

		KeyClass::Property => sink.set_property(element, key, next),

		KeyClass::Attribute => {
			let namespace = if svg && key.starts_with("xlink:") { Some(XLINK_NAMESPACE) } else { None };
			match next.and_then(Value::to_text) {
				Some(text) => sink.set_attribute(element, namespace, key, &text),
				None => {
					trace!(key, "Removing attribute.");
					sink.remove_attribute(element, namespace, key)
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::{apply_data, classify_key, Callback, DataSink, KeyClass, Value, XLINK_NAMESPACE};
	use core::convert::Infallible;

	#[derive(Default)]
	struct Log(Vec<String>);
	impl DataSink for Log {
		type Handle = ();
		type Error = Infallible;

		fn set_attribute(&mut self, _: &(), namespace: Option<&'static str>, name: &str, value: &str) -> Result<(), Infallible> {
			self.0.push(format!("attr {:?} {}={}", namespace, name, value));
			Ok(())
		}
		fn remove_attribute(&mut self, _: &(), _: Option<&'static str>, name: &str) -> Result<(), Infallible> {
			self.0.push(format!("-attr {}", name));
			Ok(())
		}
		fn set_property(&mut self, _: &(), name: &str, value: Option<&Value>) -> Result<(), Infallible> {
			self.0.push(format!("prop {}={:?}", name, value));
			Ok(())
		}
		fn set_style(&mut self, _: &(), name: &str, value: Option<&str>) -> Result<(), Infallible> {
			self.0.push(format!("style {}={:?}", name, value));
			Ok(())
		}
		fn add_listener(&mut self, _: &(), event: &str, _: &Callback) -> Result<(), Infallible> {
			self.0.push(format!("+on {}", event));
			Ok(())
		}
		fn remove_listener(&mut self, _: &(), event: &str, _: &Callback) -> Result<(), Infallible> {
			self.0.push(format!("-on {}", event));
			Ok(())
		}
	}

	#[test]
	fn key_classes() {
		assert_eq!(classify_key("style", false), KeyClass::Style);
		assert_eq!(classify_key("class", false), KeyClass::Class);
		assert_eq!(classify_key("onClick", false), KeyClass::Listener("Click"));
		assert_eq!(classify_key("on", false), KeyClass::Attribute);
		assert_eq!(classify_key("checked", false), KeyClass::Property);
		assert_eq!(classify_key("innerHTML", false), KeyClass::Property);
		assert_eq!(classify_key("id", false), KeyClass::Attribute);
	}

	#[test]
	fn svg_keys_are_case_sensitive_attributes() {
		assert_eq!(classify_key("viewBox", true), KeyClass::Attribute);
		assert_eq!(classify_key("preserveAspectRatio", true), KeyClass::Attribute);
		assert_eq!(classify_key("value", true), KeyClass::Property);
		assert_eq!(classify_key("onClick", true), KeyClass::Listener("Click"));

		let mut log = Log::default();
		apply_data(&mut log, &(), "viewBox", None, Some(&"0 0 1 1".into()), true).unwrap();
		assert_eq!(log.0, ["attr None viewBox=0 0 1 1"]);
	}

	#[test]
	fn numbers_compare_by_bits() {
		assert_eq!(Value::Number(f64::NAN), Value::Number(f64::NAN));
		assert_ne!(Value::Number(0.0), Value::Number(-0.0));
		assert_eq!(Value::Number(1.5), Value::Number(1.5));
		assert_ne!(Value::Number(1.0), Value::Text("1".into()));
	}

	#[test]
	fn style_is_merged_per_declaration() {
		let mut log = Log::default();
		let previous = Value::Style(vec![("color".into(), "red".into()), ("width".into(), "1px".into())]);
		let next = Value::Style(vec![("color".into(), "red".into()), ("height".into(), "2px".into())]);
		apply_data(&mut log, &(), "style", Some(&previous), Some(&next), false).unwrap();
		assert_eq!(log.0, ["style height=Some(\"2px\")", "style width=None"]);
	}

	#[test]
	fn listeners_are_swapped() {
		let mut log = Log::default();
		let a = Value::Listener(Callback::new(|_| ()));
		let b = Value::Listener(Callback::new(|_| ()));
		apply_data(&mut log, &(), "onClick", Some(&a), Some(&b), false).unwrap();
		apply_data(&mut log, &(), "onInput", Some(&a), None, false).unwrap();
		assert_eq!(log.0, ["-on click", "+on click", "-on input"]);
	}

	#[test]
	fn attributes() {
		let mut log = Log::default();
		apply_data(&mut log, &(), "disabled", None, Some(&Value::Bool(true)), false).unwrap();
		apply_data(&mut log, &(), "disabled", Some(&Value::Bool(true)), Some(&Value::Bool(false)), false).unwrap();
		apply_data(&mut log, &(), "xlink:href", None, Some(&"#a".into()), true).unwrap();
		apply_data(&mut log, &(), "class", None, Some(&Value::Class(vec!["a".into(), "b".into()])), false).unwrap();
		assert_eq!(
			log.0,
			[
				"attr None disabled=".to_owned(),
				"-attr disabled".to_owned(),
				format!("attr {:?} xlink:href=#a", Some(XLINK_NAMESPACE)),
				"attr None class=a b".to_owned(),
			]
		);
	}

	#[test]
	fn callbacks_compare_by_identity() {
		let a = Callback::new(|_| ());
		let b = Callback::new(|_| ());
		assert_eq!(a, a.clone());
		assert_ne!(a, b);
	}
}
