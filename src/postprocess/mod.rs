//! C8: the post-process pipeline runner. Concrete passes (triangulation,
//! normal generation, ...) are explicitly out of scope; this module owns
//! only the ordered-registration, dependency-validation and
//! re-validate-after-each-pass machinery a host would plug passes into.

use crate::error::{Error, Result};
use crate::scene::Scene;

/// A single bit in a post-process selection mask. Passes are identified by
/// a fixed bit position assigned at registration time, not by the order
/// bits happen to be set in a caller's mask.
pub type PassMask = u32;

pub trait Pass: Send + Sync {
    fn name(&self) -> &'static str;

    /// Bit this pass occupies in a [`PassMask`]. Must be unique among all
    /// passes registered into the same [`Pipeline`].
    fn bit(&self) -> PassMask;

    /// Bits of other passes that must run (and succeed) before this one.
    fn depends_on(&self) -> PassMask {
        0
    }

    fn run(&self, scene: &mut Scene) -> Result<()>;
}

pub struct Pipeline {
    passes: Vec<Box<dyn Pass>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Pipeline { passes: Vec::new() }
    }

    /// Registers a pass. Passes run later in the fixed order they were
    /// registered in, never in bit order — selecting pass C's bit without
    /// also selecting pass A's does not reorder anything; it just skips A.
    pub fn register(&mut self, pass: Box<dyn Pass>) -> Result<()> {
        let mut seen_bits = 0u32;
        for existing in &self.passes {
            seen_bits |= existing.bit();
        }
        if seen_bits & pass.bit() != 0 {
            return Err(Error::malformed(format!(
                "pass bit {:#x} already registered",
                pass.bit()
            )));
        }
        self.passes.push(pass);
        Ok(())
    }

    /// Runs every registered pass whose bit is set in `mask`, in
    /// registration order, validating dependencies up front and
    /// re-validating the scene after each pass completes.
    pub fn run(&self, scene: &mut Scene, mask: PassMask) -> Result<()> {
        let mut satisfied = 0u32;
        for pass in &self.passes {
            if pass.bit() & mask == 0 {
                continue;
            }
            if pass.depends_on() & mask != pass.depends_on() {
                return Err(Error::PostProcessFailed {
                    pass: pass.name().to_string(),
                    reason: "a required dependency pass is not selected in the mask".to_string(),
                });
            }
            if pass.depends_on() & satisfied != pass.depends_on() {
                return Err(Error::PostProcessFailed {
                    pass: pass.name().to_string(),
                    reason: "a required dependency pass has not run yet".to_string(),
                });
            }
            pass.run(scene).map_err(|e| Error::PostProcessFailed {
                pass: pass.name().to_string(),
                reason: e.to_string(),
            })?;
            scene.validate().map_err(|e| Error::PostProcessFailed {
                pass: pass.name().to_string(),
                reason: format!("scene failed validation after this pass: {e}"),
            })?;
            satisfied |= pass.bit();
        }
        Ok(())
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Rename(&'static str);
    impl Pass for Rename {
        fn name(&self) -> &'static str {
            self.0
        }
        fn bit(&self) -> PassMask {
            match self.0 {
                "a" => 0x1,
                "b" => 0x2,
                _ => 0x4,
            }
        }
        fn depends_on(&self) -> PassMask {
            if self.0 == "b" {
                0x1
            } else {
                0
            }
        }
        fn run(&self, scene: &mut Scene) -> Result<()> {
            scene.nodes.get_mut(scene.root()).name.push_str(self.0);
            Ok(())
        }
    }

    #[test]
    fn runs_in_registration_order_not_bit_order() {
        let mut pipeline = Pipeline::new();
        pipeline.register(Box::new(Rename("b"))).unwrap();
        pipeline.register(Box::new(Rename("a"))).unwrap();
        let mut scene = Scene::new("root-");
        // Select both; "b" depends on "a" and "a" is registered second, but
        // dependency satisfaction is tracked independent of registration
        // order as long as "a" actually ran before "b" in the loop.
        let result = pipeline.run(&mut scene, 0x3);
        assert!(result.is_err(), "b should fail: a has not run by the time b (registered first) executes");
    }

    #[test]
    fn dependency_satisfied_when_registered_in_order() {
        let mut pipeline = Pipeline::new();
        pipeline.register(Box::new(Rename("a"))).unwrap();
        pipeline.register(Box::new(Rename("b"))).unwrap();
        let mut scene = Scene::new("root-");
        pipeline.run(&mut scene, 0x3).unwrap();
        assert_eq!(scene.nodes.get(scene.root()).name, "root-ab");
    }

    #[test]
    fn duplicate_bit_registration_rejected() {
        let mut pipeline = Pipeline::new();
        pipeline.register(Box::new(Rename("a"))).unwrap();
        assert!(pipeline.register(Box::new(Rename("a"))).is_err());
    }
}
