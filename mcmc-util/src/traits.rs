/// Stateful detector over a stream of scalar chain summaries.
///
/// Each call to [`check`](ConvergenceCriterion::check) compares the current
/// sample window against whatever the criterion remembered from the previous
/// call. There is no reference point on the first call, so it must report
/// `false`.
pub trait ConvergenceCriterion {
    /// Consume the current window and report whether the chain has stabilised
    fn check(&mut self, samples: &[f64]) -> bool;

    /// Human-readable status of the current estimate
    fn report(&self) -> String;

    /// Forget the previous estimate; the next `check` returns `false`
    fn reset(&mut self);
}
