/// Linear dry/wet crossfade. `0.0` is fully dry, `1.0` fully processed.
#[inline]
pub fn dry_wet(dry: f32, wet: f32, amount: f32) -> f32 {
    dry.mul_add(1.0 - amount, wet * amount)
}
