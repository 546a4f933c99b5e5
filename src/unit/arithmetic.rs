//! Stateless per-sample arithmetic units.
//!
//! Every unit here is a pure function of its inputs at the same frame index:
//! no memory, nothing to reset. Combined with constants they cover gain
//! (`Multiply`), offset (`Add`), affine maps such as polarity conversion
//! (`MultiplyAdd`) and fuzzy logic (`Minimum`/`Maximum`).

use crate::unit::{AudioUnit, InputSpec, Inputs, RenderCtx};

pub const INPUT_A: usize = 0;
pub const INPUT_B: usize = 1;
pub const INPUT_C: usize = 2;

macro_rules! arithmetic_unit {
    (
        $(#[$meta:meta])*
        $name:ident, [$($arg:ident @ $index:literal : $input:literal = $default:expr),+] => $body:expr
    ) => {
        $(#[$meta])*
        #[derive(Debug, Default, Clone, Copy)]
        pub struct $name;

        impl $name {
            pub fn new() -> Self {
                Self
            }

            /// Evaluate the unit's function for one frame.
            #[inline]
            pub fn apply($($arg: f32),+) -> f32 {
                $body
            }
        }

        impl AudioUnit for $name {
            fn name(&self) -> &'static str {
                stringify!($name)
            }

            fn inputs(&self) -> &'static [InputSpec] {
                const INPUTS: &[InputSpec] = &[$(InputSpec::new($input, $default)),+];
                INPUTS
            }

            fn render(&mut self, inputs: &Inputs<'_>, out: &mut [f32], _ctx: &RenderCtx) {
                $(let $arg = inputs.get($index);)+
                for (i, sample) in out.iter_mut().enumerate() {
                    *sample = Self::apply($($arg.at(i)),+);
                }
            }
        }
    };
}

arithmetic_unit!(
    /// out = a + b
    Add, [a @ 0: "input_a" = 0.0, b @ 1: "input_b" = 0.0] => a + b
);

arithmetic_unit!(
    /// out = a × b
    Multiply, [a @ 0: "input_a" = 1.0, b @ 1: "input_b" = 1.0] => a * b
);

arithmetic_unit!(
    /// out = a × b + c
    MultiplyAdd,
    [a @ 0: "input_a" = 0.0, b @ 1: "input_b" = 1.0, c @ 2: "input_c" = 0.0] => a * b + c
);

arithmetic_unit!(
    /// out = min(a, b)
    Minimum, [a @ 0: "input_a" = 0.0, b @ 1: "input_b" = 0.0] => a.min(b)
);

arithmetic_unit!(
    /// out = max(a, b)
    Maximum, [a @ 0: "input_a" = 0.0, b @ 1: "input_b" = 0.0] => a.max(b)
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::test_util::render;
    use crate::unit::Signal;

    #[test]
    fn add_and_multiply() {
        let a = [1.0, 2.0, 3.0];
        let out = render(&mut Add::new(), &[Signal::Buffer(&a), Signal::Constant(0.5)], 3);
        assert_eq!(out, [1.5, 2.5, 3.5]);

        let out = render(&mut Multiply::new(), &[Signal::Buffer(&a), Signal::Constant(-2.0)], 3);
        assert_eq!(out, [-2.0, -4.0, -6.0]);
    }

    #[test]
    fn multiply_add_maps_bipolar_to_unipolar() {
        let bipolar = [-1.0, 0.0, 1.0];
        let out = render(
            &mut MultiplyAdd::new(),
            &[Signal::Buffer(&bipolar), Signal::Constant(0.5), Signal::Constant(0.5)],
            3,
        );
        assert_eq!(out, [0.0, 0.5, 1.0]);
    }

    #[test]
    fn min_max_select_per_sample() {
        let a = [0.2, -0.7, 0.9];
        let b = [0.5, -0.1, -0.3];
        let signals = [Signal::Buffer(&a), Signal::Buffer(&b)];
        assert_eq!(render(&mut Minimum::new(), &signals, 3), [0.2, -0.7, -0.3]);
        assert_eq!(render(&mut Maximum::new(), &signals, 3), [0.5, -0.1, 0.9]);
    }

    #[test]
    fn declared_inputs_and_defaults() {
        assert_eq!(MultiplyAdd::new().inputs().len(), 3);
        assert_eq!(MultiplyAdd::new().input_index("input_c"), Some(INPUT_C));
        assert_eq!(Multiply::new().inputs()[INPUT_B].default, 1.0);
        assert_eq!(Add::new().name(), "Add");
    }
}
