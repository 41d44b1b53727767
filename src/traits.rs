use palette::cast::ArrayCast;

/// A color type that can be viewed as an array of `N` components.
///
/// This is implemented for every [`palette`] color type that is castable to `[Component; N]`,
/// e.g., `Srgba<u8>` for `ColorComponents<u8, 4>` and `Srgb<u8>` for `ColorComponents<u8, 3>`.
pub trait ColorComponents<Component, const N: usize>:
    ArrayCast<Array = [Component; N]> + Copy + 'static
{
}

impl<Color, Component, const N: usize> ColorComponents<Component, N> for Color where
    Color: ArrayCast<Array = [Component; N]> + Copy + 'static
{
}
