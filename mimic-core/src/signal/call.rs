//! Round-trip call construction.
//!
//! When a signal fires in the browser, the client first runs the signal's
//! learned script and then, if the signal is exposed, asks the server to run
//! the rest. The generated JavaScript has three parts:
//!
//! 1. A prelude binding the positional arguments `a1..a6` (unset ones are
//!    `null`) so learned scripts may refer to them.
//! 2. The signal's current script.
//! 3. For exposed signals only, the server call
//!    `<app>.emit('<form id>', <descriptor>, a1, ..., aN);`.

use smallvec::SmallVec;

use crate::error::SignalError;

/// Maximum number of positional arguments of a round-trip call.
pub const MAX_CALL_ARGS: usize = 6;

/// Arguments of a round-trip call.
///
/// Arguments are JavaScript expressions added strictly left to right, so an
/// argument can only be present if every argument before it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundTripCall {
    binding: Option<EventBinding>,
    args: SmallVec<[String; MAX_CALL_ARGS]>,
}

/// Event object and event expressions passed with a positional event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBinding {
    pub event_object: String,
    pub event: String,
}

/// What the session needs to know about a signal to render a call.
pub(crate) struct CallTarget<'a> {
    pub app_class: &'a str,
    pub form_id: &'a str,
    pub name: &'a str,
    pub script: &'a str,
    pub exposed: bool,
}

impl RoundTripCall {
    /// A call that describes the event by name only.
    pub fn new() -> Self {
        Self::default()
    }

    /// A call that also passes an event object and event.
    pub fn bound(event_object: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            binding: Some(EventBinding {
                event_object: event_object.into(),
                event: event.into(),
            }),
            args: SmallVec::new(),
        }
    }

    /// Append the next positional argument.
    pub fn arg(mut self, expression: impl Into<String>) -> Result<Self, SignalError> {
        let expression = expression.into();
        if self.args.len() == MAX_CALL_ARGS {
            return Err(SignalError::TooManyArguments);
        }
        if expression.is_empty() {
            return Err(SignalError::EmptyArgument(self.args.len() + 1));
        }
        self.args.push(expression);
        Ok(self)
    }

    /// Build a call from a list of arguments.
    pub fn with_args<I, S>(args: I) -> Result<Self, SignalError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        args.into_iter().try_fold(Self::new(), |call, arg| call.arg(arg))
    }

    /// The positional arguments.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The event binding, if any.
    pub fn binding(&self) -> Option<&EventBinding> {
        self.binding.as_ref()
    }

    pub(crate) fn render(&self, target: &CallTarget<'_>) -> String {
        let mut out = String::from("var ");
        for i in 0..MAX_CALL_ARGS {
            if i > 0 {
                out.push(',');
            }
            let value = self.args.get(i).map_or("null", String::as_str);
            out.push_str(&format!("a{}={}", i + 1, value));
        }
        out.push(';');

        out.push_str(target.script);

        if target.exposed {
            out.push_str(&format!(
                "{}.emit('{}'",
                target.app_class,
                js_quote(target.form_id)
            ));
            match &self.binding {
                Some(binding) => out.push_str(&format!(
                    ", {{ name:'{}', eventObject:{},event:{}}}",
                    js_quote(target.name),
                    binding.event_object,
                    binding.event
                )),
                None => out.push_str(&format!(",'{}'", js_quote(target.name))),
            }
            for arg in &self.args {
                out.push(',');
                out.push_str(arg);
            }
            out.push_str(");");
        }

        out
    }
}

/// Escape a value for use inside a single-quoted JavaScript string.
fn js_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}
