use core::fmt;

use tracing::debug;

use crate::dto::capacity::CapacityDescriptor;

pub const CPU_RESOURCE_NAME: &str = "cpu";
pub const MEMORY_RESOURCE_NAME: &str = "memory";
// Follows the resource naming scheme of the NVIDIA device plugin
pub const GPU_RESOURCE_NAME: &str = "nvidia.com/gpu";

/// Below these thresholds a dimension counts as zero for the emptiness
/// tests; repeated arithmetic leaves residues that exact comparisons
/// would misread.
const MIN_MILLI_CPU: f64 = 10.0;
const MIN_MEMORY: f64 = 10.0 * 1024.0 * 1024.0;

/// Absolute tolerances used by [`ResourceVector::less_eq`].
const MILLI_CPU_TOLERANCE: f64 = 0.01;
const MEMORY_TOLERANCE: f64 = 1.0;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Resource dimension not supported: {0}")]
    UnrecognizedDimension(String),
    #[error(
        "Resource subtraction resulted in a negative value, total \
         resource: {original}, subtracting resource: {subtrahend}"
    )]
    NegativeResultClamped {
        /// Snapshot of the receiver before any dimension was clamped.
        original:   ResourceVector,
        subtrahend: ResourceVector,
    },
}

/// Allocatable or requested capacity of a node, over the fixed
/// dimension set {cpu, memory, gpu}.
///
/// cpu is counted in milli-units (1/1000 of a logical processor),
/// memory in bytes, gpu as a whole accelerator count. The vector is a
/// plain value: no interior locking, and sharing one across workers
/// requires external synchronization or independent clones.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResourceVector {
    pub milli_cpu: f64,
    pub memory:    f64,
    pub gpu:       i64,
}

impl ResourceVector {
    pub fn empty() -> Self {
        Self { milli_cpu: 0.0, memory: 0.0, gpu: 0 }
    }

    /// Floor capacity below which a node or a request is treated as
    /// negligible by the callers.
    pub fn minimum_viable() -> Self {
        Self { milli_cpu: 0.1, memory: 10.0, gpu: 0 }
    }

    /// Sums the recognized entries of the descriptor: cpu at the milli
    /// scale, memory in bytes, gpu as an integer count (truncated
    /// toward zero). Unrecognized dimension names are skipped.
    pub fn from_capacity_descriptor(descriptor: &CapacityDescriptor) -> Self {
        let mut resource = Self::empty();
        for (name, quantity) in descriptor.iter() {
            match name.as_str() {
                CPU_RESOURCE_NAME => {
                    resource.milli_cpu += quantity.milli_value() as f64;
                }
                MEMORY_RESOURCE_NAME => {
                    resource.memory += quantity.value() as f64;
                }
                GPU_RESOURCE_NAME => {
                    resource.gpu += quantity.as_i64();
                }
                _ => debug!(
                    "Skipping unsupported resource dimension {}",
                    name
                ),
            }
        }
        resource
    }

    /// Elementwise sum, in place.
    pub fn add(&mut self, rhs: &ResourceVector) -> &mut Self {
        self.milli_cpu += rhs.milli_cpu;
        self.memory += rhs.memory;
        self.gpu += rhs.gpu;
        self
    }

    /// Overwrites all dimensions with the values of `rhs`.
    pub fn replace(&mut self, rhs: &ResourceVector) -> &mut Self {
        self.milli_cpu = rhs.milli_cpu;
        self.memory = rhs.memory;
        self.gpu = rhs.gpu;
        self
    }

    /// Elementwise subtraction, in place; alias for [`Self::sub_clamped`].
    pub fn sub(&mut self, rhs: &ResourceVector) -> Result<(), Error> {
        self.sub_clamped(rhs)
    }

    /// Elementwise subtraction, in place, flooring at zero every
    /// dimension that would go negative.
    ///
    /// When a dimension is clamped the error carries the pre-clamp
    /// snapshot and the subtrahend; the receiver keeps the clamped
    /// result either way, so accounting state never goes negative.
    pub fn sub_clamped(&mut self, rhs: &ResourceVector) -> Result<(), Error> {
        let original = self.clone();
        let mut clamped = false;

        if self.milli_cpu < rhs.milli_cpu {
            self.milli_cpu = 0.0;
            clamped = true;
        } else {
            self.milli_cpu -= rhs.milli_cpu;
        }
        if self.memory < rhs.memory {
            self.memory = 0.0;
            clamped = true;
        } else {
            self.memory -= rhs.memory;
        }
        if self.gpu < rhs.gpu {
            self.gpu = 0;
            clamped = true;
        } else {
            self.gpu -= rhs.gpu;
        }

        if clamped {
            return Err(Error::NegativeResultClamped {
                original,
                subtrahend: rhs.clone(),
            });
        }
        Ok(())
    }

    /// True iff every dimension is below its zero threshold. The test
    /// is conjunctive: abundant memory with negligible cpu is not
    /// empty.
    pub fn is_empty(&self) -> bool {
        self.milli_cpu < MIN_MILLI_CPU
            && self.memory < MIN_MEMORY
            && self.gpu == 0
    }

    /// Per-dimension zero test, with the same thresholds as
    /// [`Self::is_empty`].
    pub fn is_zero(&self, name: &str) -> Result<bool, Error> {
        match name {
            CPU_RESOURCE_NAME => Ok(self.milli_cpu < MIN_MILLI_CPU),
            MEMORY_RESOURCE_NAME => Ok(self.memory < MIN_MEMORY),
            GPU_RESOURCE_NAME => Ok(self.gpu == 0),
            _ => Err(Error::UnrecognizedDimension(name.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Result<f64, Error> {
        match name {
            CPU_RESOURCE_NAME => Ok(self.milli_cpu),
            MEMORY_RESOURCE_NAME => Ok(self.memory),
            GPU_RESOURCE_NAME => Ok(self.gpu as f64),
            _ => Err(Error::UnrecognizedDimension(name.to_string())),
        }
    }

    /// The recognized dimension names, in stable order.
    pub fn dimension_names() -> [&'static str; 3] {
        [CPU_RESOURCE_NAME, MEMORY_RESOURCE_NAME, GPU_RESOURCE_NAME]
    }

    /// Strict on all three dimensions at once. Not a total order:
    /// vectors equal on any single dimension are never `less` in
    /// either direction.
    pub fn less(&self, rhs: &ResourceVector) -> bool {
        self.milli_cpu < rhs.milli_cpu
            && self.memory < rhs.memory
            && self.gpu < rhs.gpu
    }

    /// cpu and memory compare within an absolute tolerance that
    /// absorbs float residue from repeated add/sub sequences; gpu
    /// compares exactly. Deliberately not the non-strict counterpart
    /// of [`Self::less`].
    pub fn less_eq(&self, rhs: &ResourceVector) -> bool {
        (self.milli_cpu < rhs.milli_cpu
            || (rhs.milli_cpu - self.milli_cpu).abs() < MILLI_CPU_TOLERANCE)
            && (self.memory < rhs.memory
                || (rhs.memory - self.memory).abs() < MEMORY_TOLERANCE)
            && self.gpu <= rhs.gpu
    }
}

impl fmt::Display for ResourceVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cpu {:.2}, memory {:.2}, GPU {}",
            self.milli_cpu, self.memory, self.gpu
        )
    }
}
