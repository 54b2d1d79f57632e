//! Operator-driven hole sampling: three rim points per hole, repeated until
//! the operator stops.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use seekscan_core::errors::SeekError;
use seekscan_core::{Microscope, Operator, Point2D};
use seekscan_geom::{fit_circle, CircleFit};

/// What the operator wants after seeing a fitted hole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleDecision {
    /// Keep the hole and sample another.
    Continue,
    /// Discard the hole and sample it again.
    Redo,
    /// Keep the hole and stop sampling.
    Stop,
}

impl SampleDecision {
    /// Parses a `[YES/no/redo]` answer; anything unrecognised continues.
    pub fn parse(answer: &str) -> Self {
        let answer = answer.trim().to_ascii_lowercase();
        if answer.starts_with('n') {
            SampleDecision::Stop
        } else if answer.starts_with('r') {
            SampleDecision::Redo
        } else {
            SampleDecision::Continue
        }
    }
}

/// Lazy sequence of fitted holes collected with the operator.
///
/// Each step asks the operator to center the camera on three rim points and
/// reads the stage position after every confirmation. A fit that fails on
/// degenerate geometry is sampled again. `Redo` samples the same hole again
/// without yielding; `Stop` yields the current hole and ends the sequence.
pub struct HoleSampler<'a, M: Microscope + ?Sized, O: Operator + ?Sized> {
    microscope: &'a M,
    operator: &'a mut O,
    rng: StdRng,
    finished: bool,
}

impl<'a, M: Microscope + ?Sized, O: Operator + ?Sized> HoleSampler<'a, M, O> {
    /// Creates a sampler; `seed` drives the synthetic circle used when the
    /// stage reports the origin for all three points.
    pub fn new(microscope: &'a M, operator: &'a mut O, seed: u64) -> Self {
        Self {
            microscope,
            operator,
            rng: StdRng::seed_from_u64(seed),
            finished: false,
        }
    }

    fn sample_rim(&mut self) -> Result<[Point2D; 3], SeekError> {
        self.operator
            .prompt("Pick 3 points centering the camera on the edge of a hole")?;
        let mut rim = [Point2D::ORIGIN; 3];
        for (idx, slot) in rim.iter_mut().enumerate() {
            self.operator.prompt(&format!(" {} >> ", idx + 1))?;
            *slot = self.microscope.stage_position()?;
            tracing::debug!(point = idx + 1, position = %slot, "rim point");
        }
        if rim.iter().all(|point| *point == Point2D::ORIGIN) {
            tracing::info!("stage reports the origin, substituting a synthetic circle");
            rim = synthetic_circle(&mut self.rng);
        }
        Ok(rim)
    }

    fn next_hole(&mut self) -> Result<CircleFit, SeekError> {
        loop {
            let rim = self.sample_rim()?;
            let fit = match fit_circle(rim) {
                Ok(fit) => fit,
                Err(SeekError::Geometry(info)) => {
                    tracing::warn!(%info, "could not determine circle center/radius, try again");
                    continue;
                }
                Err(other) => return Err(other),
            };
            tracing::info!(center = %fit.center, radius = fit.radius, spread = fit.spread, "hole fitted");

            let answer = self.operator.prompt("continue? [YES/no/redo] >> ")?;
            match SampleDecision::parse(&answer) {
                SampleDecision::Continue => return Ok(fit),
                SampleDecision::Redo => continue,
                SampleDecision::Stop => {
                    self.finished = true;
                    return Ok(fit);
                }
            }
        }
    }
}

impl<M: Microscope + ?Sized, O: Operator + ?Sized> Iterator for HoleSampler<'_, M, O> {
    type Item = Result<CircleFit, SeekError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_hole() {
            Ok(fit) => Some(Ok(fit)),
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

/// Three points on the upper half of a unit circle whose center is jittered
/// around the origin.
pub fn synthetic_circle(rng: &mut impl Rng) -> [Point2D; 3] {
    let da = rng.gen_range(-5i32..5) as f64 * 2.2;
    let db = rng.gen_range(-5i32..5) as f64 * 2.2;
    let mut rim = [Point2D::ORIGIN; 3];
    for slot in rim.iter_mut() {
        let a = rng.gen_range(-100i32..100) as f64 / 100.0;
        let b = (1.0 - a * a).sqrt();
        *slot = Point2D::new(a + da, b + db);
    }
    rim
}
