//! Runtime builtins.

use compact_str::{CompactString, ToCompactString as _};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tadpole_heap::{Arity, NativeContext, NativeError, NativeFunction, Value};

/// Print every argument separated by spaces, then a newline.
#[derive(Debug)]
pub(crate) struct Print;

impl NativeFunction for Print {
    fn call(&self, context: &mut NativeContext<'_>, args: &[Value]) -> Result<Value, NativeError> {
        let mut line = String::new();
        for (index, arg) in args.iter().enumerate() {
            if index > 0 {
                line.push(' ');
            }
            let text = arg.resolve(context.heap).to_compact_string();
            line.push_str(&text);
        }
        line.push('\n');
        context.output.write_str(&line)?;
        Ok(Value::Nil)
    }

    fn name(&self) -> &'static str {
        "print"
    }

    fn arity(&self) -> Arity {
        Arity::Variadic
    }
}

/// Seconds since the unix epoch, to millisecond precision.
#[derive(Debug)]
pub(crate) struct Time;

impl NativeFunction for Time {
    fn call(&self, _context: &mut NativeContext<'_>, _args: &[Value]) -> Result<Value, NativeError> {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_err| NativeError::Message(CompactString::const_new("time went backwards")))?;
        #[expect(clippy::cast_precision_loss, reason = "no way to avoid this.")]
        let millis = since_epoch.as_millis() as f64;
        Ok(Value::Number(millis / 1000.0))
    }

    fn name(&self) -> &'static str {
        "time"
    }

    fn arity(&self) -> Arity {
        Arity::Fixed(0)
    }
}

/// Seconds elapsed on a monotonic clock since the builtins were registered.
#[derive(Debug)]
pub(crate) struct Clock {
    started: Instant,
}

impl Default for Clock {
    fn default() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl NativeFunction for Clock {
    fn call(&self, _context: &mut NativeContext<'_>, _args: &[Value]) -> Result<Value, NativeError> {
        Ok(Value::Number(self.started.elapsed().as_secs_f64()))
    }

    fn name(&self) -> &'static str {
        "clock"
    }

    fn arity(&self) -> Arity {
        Arity::Fixed(0)
    }
}

/// Stringify a value.
#[derive(Debug)]
pub(crate) struct Stringify;

impl NativeFunction for Stringify {
    fn call(&self, context: &mut NativeContext<'_>, args: &[Value]) -> Result<Value, NativeError> {
        let [value] = *args else {
            return Err(NativeError::Message(CompactString::const_new(
                "expected one argument",
            )));
        };
        let string = value.resolve(context.heap).to_compact_string();
        Ok(Value::String(context.heap.intern_owned(string)))
    }

    fn name(&self) -> &'static str {
        "str"
    }

    fn arity(&self) -> Arity {
        Arity::Fixed(1)
    }
}

/// The number of collections run so far.
#[derive(Debug)]
pub(crate) struct GcCount;

impl NativeFunction for GcCount {
    fn call(&self, context: &mut NativeContext<'_>, _args: &[Value]) -> Result<Value, NativeError> {
        #[expect(clippy::cast_precision_loss, reason = "no way to avoid this.")]
        let count = context.heap.stats().collections as f64;
        Ok(Value::Number(count))
    }

    fn name(&self) -> &'static str {
        "gc_count"
    }

    fn arity(&self) -> Arity {
        Arity::Fixed(0)
    }
}

/// Ask for a collection at the next safe point.
#[derive(Debug)]
pub(crate) struct GcCollect;

impl NativeFunction for GcCollect {
    fn call(&self, context: &mut NativeContext<'_>, _args: &[Value]) -> Result<Value, NativeError> {
        context.heap.request_collection();
        Ok(Value::Nil)
    }

    fn name(&self) -> &'static str {
        "gc_collect"
    }

    fn arity(&self) -> Arity {
        Arity::Fixed(0)
    }
}

/// Read the collection threshold, or move it when given a live object count.
///
/// The threshold never drops below the heap's configured baseline, so the value returned can
/// differ from the one passed in.
#[derive(Debug)]
pub(crate) struct GcThreshold;

impl NativeFunction for GcThreshold {
    fn call(&self, context: &mut NativeContext<'_>, args: &[Value]) -> Result<Value, NativeError> {
        let threshold = match *args {
            [] => context.heap.threshold(),
            [Value::Number(objects)] if objects.is_finite() && objects >= 0.0 => {
                #[expect(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    reason = "checked to be finite and non-negative, saturates above usize::MAX."
                )]
                let objects = objects as usize;
                context.heap.set_threshold(objects)
            }
            _ => {
                return Err(NativeError::Message(CompactString::const_new(
                    "threshold must be a non-negative number",
                )));
            }
        };
        #[expect(clippy::cast_precision_loss, reason = "no way to avoid this.")]
        let threshold = threshold as f64;
        Ok(Value::Number(threshold))
    }

    fn name(&self) -> &'static str {
        "gc_threshold"
    }

    fn arity(&self) -> Arity {
        Arity::Range { min: 0, max: 1 }
    }
}

/// Let collections start on their own again.
#[derive(Debug)]
pub(crate) struct GcEnable;

impl NativeFunction for GcEnable {
    fn call(&self, context: &mut NativeContext<'_>, _args: &[Value]) -> Result<Value, NativeError> {
        context.heap.set_enabled(true);
        Ok(Value::Nil)
    }

    fn name(&self) -> &'static str {
        "gc_enable"
    }

    fn arity(&self) -> Arity {
        Arity::Fixed(0)
    }
}

/// Stop collections from starting on their own. `gc_collect` still works.
#[derive(Debug)]
pub(crate) struct GcDisable;

impl NativeFunction for GcDisable {
    fn call(&self, context: &mut NativeContext<'_>, _args: &[Value]) -> Result<Value, NativeError> {
        context.heap.set_enabled(false);
        Ok(Value::Nil)
    }

    fn name(&self) -> &'static str {
        "gc_disable"
    }

    fn arity(&self) -> Arity {
        Arity::Fixed(0)
    }
}

#[derive(Debug)]
pub(crate) struct GcIsEnabled;

impl NativeFunction for GcIsEnabled {
    fn call(&self, context: &mut NativeContext<'_>, _args: &[Value]) -> Result<Value, NativeError> {
        Ok(Value::Bool(context.heap.is_enabled()))
    }

    fn name(&self) -> &'static str {
        "gc_isenabled"
    }

    fn arity(&self) -> Arity {
        Arity::Fixed(0)
    }
}

#[cfg(test)]
mod test {
    use super::{GcCollect, GcDisable, GcIsEnabled, GcThreshold, Print, Stringify};
    use tadpole_heap::{GcConfig, Heap, NativeContext, NativeFunction as _, Value};

    #[test]
    fn print_separates_arguments_with_spaces() {
        let mut heap = Heap::default();
        let mut output = String::new();
        let text = Value::String(heap.intern("apples"));
        let mut context = NativeContext {
            heap: &mut heap,
            output: &mut output,
        };
        let result = Print
            .call(&mut context, &[Value::Number(3.0), text, Value::Nil])
            .unwrap();
        assert_eq!(result, Value::Nil);
        assert_eq!(output, "3 apples nil\n");
    }

    #[test]
    fn str_interns_its_result() {
        let mut heap = Heap::default();
        let mut output = String::new();
        let expected = heap.intern("2.5");
        let mut context = NativeContext {
            heap: &mut heap,
            output: &mut output,
        };
        let result = Stringify
            .call(&mut context, &[Value::Number(2.5)])
            .unwrap();
        assert_eq!(result, Value::String(expected));
    }

    #[test]
    fn gc_collect_only_requests() {
        let mut heap = Heap::default();
        let mut output = String::new();
        assert!(!heap.should_collect());
        let mut context = NativeContext {
            heap: &mut heap,
            output: &mut output,
        };
        GcCollect.call(&mut context, &[]).unwrap();
        assert!(heap.should_collect());
        assert_eq!(heap.stats().collections, 0);
    }

    #[test]
    fn gc_threshold_reads_and_clamps() {
        let mut heap = Heap::new(GcConfig {
            baseline: 64,
            ..GcConfig::default()
        });
        let mut output = String::new();
        let mut context = NativeContext {
            heap: &mut heap,
            output: &mut output,
        };
        assert_eq!(
            GcThreshold.call(&mut context, &[Value::Number(4096.0)]).unwrap(),
            Value::Number(4096.0)
        );
        assert_eq!(
            GcThreshold.call(&mut context, &[]).unwrap(),
            Value::Number(4096.0)
        );
        assert_eq!(
            GcThreshold.call(&mut context, &[Value::Number(1.0)]).unwrap(),
            Value::Number(64.0)
        );
        assert!(GcThreshold.call(&mut context, &[Value::Number(-1.0)]).is_err());
        assert!(GcThreshold.call(&mut context, &[Value::Nil]).is_err());
        assert_eq!(heap.threshold(), 64);
    }

    #[test]
    fn gc_disable_is_reported() {
        let mut heap = Heap::default();
        let mut output = String::new();
        let mut context = NativeContext {
            heap: &mut heap,
            output: &mut output,
        };
        assert_eq!(
            GcIsEnabled.call(&mut context, &[]).unwrap(),
            Value::Bool(true)
        );
        GcDisable.call(&mut context, &[]).unwrap();
        assert_eq!(
            GcIsEnabled.call(&mut context, &[]).unwrap(),
            Value::Bool(false)
        );
        assert!(!heap.is_enabled());
    }
}
