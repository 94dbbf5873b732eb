//! Case catalog: the fixed, ordered table of kernel invocations.
//!
//! Execution order and report order both follow catalog order. The table is
//! authored once; [`validate_catalog`] rejects malformed entries at startup.

use crate::error::{HarnessError, Result};
use std::collections::HashSet;
use std::fmt;

/// Numeric precision selected by the kernel's dtype argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dtype {
    /// 32-bit float, code `0`
    Fp32,
    /// 16-bit float, code `1`
    Fp16,
}

impl Dtype {
    /// Integer code understood by the kernel
    pub fn code(self) -> u8 {
        match self {
            Dtype::Fp32 => 0,
            Dtype::Fp16 => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dtype::Fp32 => "fp32",
            Dtype::Fp16 => "fp16",
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Lp norm exponent: a positive real or positive infinity (Chebyshev)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormExponent {
    Finite(f64),
    Infinity,
}

impl NormExponent {
    /// Textual form passed to the kernel.
    ///
    /// Whole numbers keep one fractional digit (`2.0`), other values use the
    /// shortest round-trip form (`0.5`), infinity is `inf`.
    pub fn to_arg(self) -> String {
        match self {
            NormExponent::Infinity => "inf".to_string(),
            NormExponent::Finite(p) if p.fract() == 0.0 => format!("{p:.1}"),
            NormExponent::Finite(p) => format!("{p}"),
        }
    }

    pub fn is_valid(self) -> bool {
        match self {
            NormExponent::Infinity => true,
            NormExponent::Finite(p) => p.is_finite() && p > 0.0,
        }
    }

    /// Value as f64, with `f64::INFINITY` for the sentinel
    pub fn value(self) -> f64 {
        match self {
            NormExponent::Infinity => f64::INFINITY,
            NormExponent::Finite(p) => p,
        }
    }
}

impl fmt::Display for NormExponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.to_arg())
    }
}

/// One named kernel invocation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaseDescriptor {
    /// Unique display key
    pub name: &'static str,
    /// Row count
    pub n: u64,
    /// Column count
    pub m: u64,
    pub p: NormExponent,
    pub dtype: Dtype,
}

impl CaseDescriptor {
    pub const fn new(name: &'static str, n: u64, m: u64, p: NormExponent, dtype: Dtype) -> Self {
        Self {
            name,
            n,
            m,
            p,
            dtype,
        }
    }

    /// Positional kernel arguments: `N M P dtype`
    pub fn args(&self) -> [String; 4] {
        [
            self.n.to_string(),
            self.m.to_string(),
            self.p.to_arg(),
            self.dtype.code().to_string(),
        ]
    }

    /// `NxM`
    pub fn shape_label(&self) -> String {
        format!("{}x{}", self.n, self.m)
    }
}

const fn case(name: &'static str, n: u64, m: u64, p: f64, dtype: Dtype) -> CaseDescriptor {
    CaseDescriptor::new(name, n, m, NormExponent::Finite(p), dtype)
}

/// Built-in benchmark table.
///
/// Covers p in {1, 2, inf, 0.5, 3.0}, odd extents on both axes, a minimal
/// shape, and large shapes for each dtype.
pub const DEFAULT_CATALOG: &[CaseDescriptor] = &[
    // Basic functionality
    case("Case01_Base", 1024, 128, 2.0, Dtype::Fp32),
    case("Case02_FP16", 1024, 128, 2.0, Dtype::Fp16),
    case("Case03_Manhat", 1024, 128, 1.0, Dtype::Fp32),
    CaseDescriptor::new("Case04_Inf", 1024, 128, NormExponent::Infinity, Dtype::Fp32),
    // General p
    case("Case05_P_3.0", 512, 128, 3.0, Dtype::Fp32),
    case("Case06_P_0.5", 512, 128, 0.5, Dtype::Fp32),
    // Unaligned and tiny shapes
    case("Case07_Odd_M", 128, 33, 2.0, Dtype::Fp32),
    case("Case08_Odd_N", 33, 128, 2.0, Dtype::Fp32),
    case("Case09_Small", 16, 16, 2.0, Dtype::Fp32),
    // Performance
    case("Case10_Tall", 4096, 32, 2.0, Dtype::Fp32),
    case("Case11_Wide", 256, 4096, 2.0, Dtype::Fp32),
    case("Case12_Large", 2048, 3008, 2.0, Dtype::Fp16),
];

/// Reject duplicate names, zero extents and non-positive exponents.
pub fn validate_catalog(cases: &[CaseDescriptor]) -> Result<()> {
    let mut seen = HashSet::with_capacity(cases.len());
    for case in cases {
        if case.name.is_empty() {
            return Err(HarnessError::InvalidCatalog("case with empty name".into()));
        }
        if !seen.insert(case.name) {
            return Err(HarnessError::InvalidCatalog(format!(
                "duplicate case name '{}'",
                case.name
            )));
        }
        if case.n == 0 || case.m == 0 {
            return Err(HarnessError::InvalidCatalog(format!(
                "case '{}' has non-positive shape {}",
                case.name,
                case.shape_label()
            )));
        }
        if !case.p.is_valid() {
            return Err(HarnessError::InvalidCatalog(format!(
                "case '{}' has invalid norm exponent {}",
                case.name,
                case.p.value()
            )));
        }
    }
    Ok(())
}

/// Sub-catalog of cases whose name contains `pattern`, in catalog order.
pub fn select_cases(cases: &[CaseDescriptor], pattern: Option<&str>) -> Vec<CaseDescriptor> {
    match pattern {
        Some(pat) => cases
            .iter()
            .filter(|c| c.name.contains(pat))
            .copied()
            .collect(),
        None => cases.to_vec(),
    }
}

/// Plain listing used by `--list`
pub fn render_catalog(cases: &[CaseDescriptor]) -> String {
    let mut out = format!(
        "{:<15} {:>6} {:>6} {:>6} {:>6}\n",
        "Case Name", "N", "M", "P", "DType"
    );
    for case in cases {
        out.push_str(&format!(
            "{:<15} {:>6} {:>6} {:>6} {:>6}\n",
            case.name, case.n, case.m, case.p, case.dtype
        ));
    }
    out
}
