//! Stateful and functional components and their update protocol.
//!
//! A mounted component is represented by a session owned by its [`Realized`] node.
//! Sessions are updated by the patch walk or, for stateful components, through
//! [`Target::update_component`](`crate::Target::update_component`). Both are synchronous.

use crate::{
	data::Data,
	diff,
	error::{BoxError, Error},
	host::Host,
	node::{FunctionalType, Node, StatefulType},
	realized::{Realized, RealizedKind},
};
use core::{
	any::Any,
	fmt::{self, Debug, Formatter},
};
use tracing::{error, trace_span};

/// A stateful component.
///
/// Instances are created through [`Default`] when first mounted and live until their node is replaced or removed.
pub trait Component<N>: 'static {
	/// Describes the component's content for the current `props` and instance state.
	fn render(&self, props: &Data) -> Node<N>;

	/// Called once the rendered tree is attached.
	fn mounted(&mut self) -> Result<(), BoxError> {
		Ok(())
	}

	/// Called after the rendered tree was detached.
	fn unmounted(&mut self) -> Result<(), BoxError> {
		Ok(())
	}
}

/// Object-safe [`Component`] with downcasting. Implemented for all components.
pub trait AnyComponent<N>: Component<N> {
	fn as_any(&self) -> &dyn Any;
	fn as_any_mut(&mut self) -> &mut dyn Any;
}
impl<N, C: Component<N>> AnyComponent<N> for C {
	fn as_any(&self) -> &dyn Any {
		self
	}

	fn as_any_mut(&mut self) -> &mut dyn Any {
		self
	}
}

/// A mounted stateful component instance and what it rendered.
pub struct StatefulSession<N> {
	component: StatefulType<N>,
	instance: Box<dyn AnyComponent<N>>,
	props: Data,
	rendered: Box<Realized<N>>,
	svg: bool,
}

impl<N: 'static> StatefulSession<N> {
	/// Instantiates `component`, renders it with `props` and mounts the result.
	pub(crate) fn mount<H: Host<Handle = N>>(
		host: &mut H,
		component: StatefulType<N>,
		props: Data,
		container: &N,
		svg: bool,
		before: Option<&N>,
	) -> Result<Self, Error<H::Error>> {
		let span = trace_span!("Mounting stateful component", component = component.name());
		let _enter = span.enter();

		let instance = component.instantiate();
		let tree = instance.render(&props);
		let rendered = Box::new(diff::mount(host, tree, container, svg, before)?);

		let mut session = Self {
			component,
			instance,
			props,
			rendered,
			svg,
		};
		session.instance.mounted().map_err(|source| Error::Lifecycle {
			component: session.component.name(),
			hook: "mounted",
			source,
		})?;
		Ok(session)
	}

	/// Replaces the props and re-renders.
	pub(crate) fn receive<H: Host<Handle = N>>(&mut self, host: &mut H, props: Data) -> Result<(), Error<H::Error>> {
		self.props = props;
		self.rerender(host)
	}

	/// Renders again and patches the previous rendered tree inside its current parent.
	///
	/// Using the parent of the rendered root lets the root itself be replaced without knowing the outer container.
	pub(crate) fn rerender<H: Host<Handle = N>>(&mut self, host: &mut H) -> Result<(), Error<H::Error>> {
		let span = trace_span!("Re-rendering stateful component", component = self.component.name());
		let _enter = span.enter();

		let container = match host.parent_node(&self.rendered.handle) {
			Some(container) => container,
			None => {
				error!("The rendered root of a mounted component is detached. Skipping re-render.");
				return Ok(());
			}
		};
		let tree = self.instance.render(&self.props);
		diff::patch(host, &mut self.rendered, tree, &container, self.svg)
	}

	pub(crate) fn unmount<H: Host<Handle = N>>(&mut self, host: &mut H, container: Option<&N>) -> Result<(), Error<H::Error>> {
		diff::unmount(host, &mut self.rendered, container)?;
		self.instance.unmounted().map_err(|source| Error::Lifecycle {
			component: self.component.name(),
			hook: "unmounted",
			source,
		})
	}

	pub(crate) fn component(&self) -> &StatefulType<N> {
		&self.component
	}

	pub(crate) fn props(&self) -> &Data {
		&self.props
	}

	pub(crate) fn rendered(&self) -> &Realized<N> {
		&self.rendered
	}

	pub(crate) fn instance(&self) -> &dyn AnyComponent<N> {
		&*self.instance
	}
}

impl<N: Debug> Debug for StatefulSession<N> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("StatefulSession")
			.field("component", &self.component)
			.field("props", &self.props)
			.field("rendered", &self.rendered)
			.finish()
	}
}

/// A mounted functional component: the props it was last called with, its container and what it rendered.
pub struct FunctionalSession<N> {
	component: FunctionalType<N>,
	props: Data,
	container: N,
	rendered: Box<Realized<N>>,
	svg: bool,
}

impl<N: Clone + 'static> FunctionalSession<N> {
	pub(crate) fn mount<H: Host<Handle = N>>(
		host: &mut H,
		component: FunctionalType<N>,
		props: Data,
		container: &N,
		svg: bool,
		before: Option<&N>,
	) -> Result<Self, Error<H::Error>> {
		let span = trace_span!("Mounting functional component", component = component.name());
		let _enter = span.enter();

		let tree = component.call(&props);
		let rendered = Box::new(diff::mount(host, tree, container, svg, before)?);
		Ok(Self {
			component,
			props,
			container: container.clone(),
			rendered,
			svg,
		})
	}

	/// Calls the function again with `props` and patches the previous result inside `container`.
	pub(crate) fn update<H: Host<Handle = N>>(&mut self, host: &mut H, props: Data, container: &N) -> Result<(), Error<H::Error>> {
		let span = trace_span!("Updating functional component", component = self.component.name());
		let _enter = span.enter();

		self.props = props;
		self.container = container.clone();
		let tree = self.component.call(&self.props);
		diff::patch(host, &mut self.rendered, tree, &self.container, self.svg)
	}
}

impl<N: 'static> FunctionalSession<N> {
	pub(crate) fn unmount<H: Host<Handle = N>>(&mut self, host: &mut H, container: Option<&N>) -> Result<(), Error<H::Error>> {
		diff::unmount(host, &mut self.rendered, container)
	}

	pub(crate) fn component(&self) -> &FunctionalType<N> {
		&self.component
	}

	pub(crate) fn props(&self) -> &Data {
		&self.props
	}

	pub(crate) fn rendered(&self) -> &Realized<N> {
		&self.rendered
	}
}

impl<N: Debug> Debug for FunctionalSession<N> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("FunctionalSession")
			.field("component", &self.component)
			.field("container", &self.container)
			.field("rendered", &self.rendered)
			.finish()
	}
}

/// Applies `update` to the first mounted instance of `C` in `node` (depth-first) and re-renders it.
///
/// Anchors along the path are refreshed, since the component's root may have been replaced.
pub(crate) fn update_first<H, C, F>(host: &mut H, node: &mut Realized<H::Handle>, update: &mut Option<F>) -> Result<bool, Error<H::Error>>
where
	H: Host,
	C: Component<H::Handle>,
	F: FnOnce(&mut C),
{
	let found = match &mut node.kind {
		RealizedKind::Stateful(session) => {
			if let Some(instance) = session.instance.as_any_mut().downcast_mut::<C>() {
				if let Some(update) = update.take() {
					update(instance)
				}
				session.rerender(host)?;
				true
			} else {
				update_first::<H, C, F>(host, &mut session.rendered, update)?
			}
		}
		RealizedKind::Functional(session) => update_first::<H, C, F>(host, &mut session.rendered, update)?,
		RealizedKind::Element { children, .. } | RealizedKind::Fragment(children) | RealizedKind::Portal { children, .. } => {
			let mut found = false;
			for child in children.iter_mut() {
				if update_first::<H, C, F>(host, child, update)? {
					found = true;
					break;
				}
			}
			found
		}
		RealizedKind::Text(_) => false,
	};

	if found {
		node.refresh_anchor();
	}
	Ok(found)
}
