use halo_bloom::{BloomError, BloomPass, ShaderProgramSet};

use crate::kernels::{Kernel, kernel_for};

/// The CPU program set. Every pass needs a kernel for the set to compile.
#[derive(Clone, Copy)]
pub struct SoftPrograms {
    kernels: [Option<Kernel>; BloomPass::COUNT],
}

impl Default for SoftPrograms {
    fn default() -> Self {
        Self::standard()
    }
}

impl SoftPrograms {
    /// The built-in kernels for all five passes.
    pub fn standard() -> Self {
        Self {
            kernels: BloomPass::ALL.map(|pass| Some(kernel_for(pass))),
        }
    }

    /// Replace the kernel used for `pass`.
    pub fn with_kernel(mut self, pass: BloomPass, kernel: Kernel) -> Self {
        self.kernels[pass.index()] = Some(kernel);
        self
    }

    /// Remove the kernel for `pass`.
    pub fn without(mut self, pass: BloomPass) -> Self {
        self.kernels[pass.index()] = None;
        self
    }
}

impl ShaderProgramSet for SoftPrograms {
    type Pipeline = SoftPipeline;

    fn compile(self) -> Result<SoftPipeline, BloomError> {
        let mut kernels = [kernel_for(BloomPass::Prefilter); BloomPass::COUNT];
        for pass in BloomPass::ALL {
            kernels[pass.index()] =
                self.kernels[pass.index()].ok_or_else(|| BloomError::Compile {
                    message: format!("no kernel for {}", pass.label()),
                })?;
        }
        Ok(SoftPipeline { kernels })
    }
}

/// Compiled CPU kernels, indexed by pass.
#[derive(Clone, Copy)]
pub struct SoftPipeline {
    kernels: [Kernel; BloomPass::COUNT],
}

impl SoftPipeline {
    pub fn kernel(&self, pass: BloomPass) -> Kernel {
        self.kernels[pass.index()]
    }
}

impl std::fmt::Debug for SoftPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoftPipeline").finish_non_exhaustive()
    }
}
