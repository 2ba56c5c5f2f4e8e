//! Separation quality at an electrophoretic cross.
//!
//! A plug of sample injected at the cross migrates down the separation
//! channel. At the detector each analyte `k` arrives as a Gaussian band
//!
//! ```text
//! C_k(t) = A · t^(-1/2) · exp(−(x_det − v_k·t)² / (4·D·t))
//! ```
//!
//! with velocity `v_k = (mu_eo + mu_k)·E`. `g_k = C_k'/C_k` and its
//! derivative `g_k'` express the peak and valley conditions without
//! differentiating inside the solver. Adjacent peaks must be separated by a
//! valley no higher than `ratio` times either peak.

use std::f64::consts::PI;

use microflow_smtlib::{Expr, Symbol, qfnra};

use super::{declare, pin, var};
use crate::error::CodegenError;
use crate::naming::entity_var;
use crate::params::ProcessParameters;
use crate::schematic::{Entity, Node, Schematic};
use crate::strategy::Strategy;
use crate::types::{ELECTROPHORETIC_CROSS, TypeTable};

pub const CROSS_PORTS: [&str; 4] = [
    "injectionIn",
    "injectionOut",
    "separationIn",
    "separationOut",
];
pub const ANALYTE_COUNT: &str = "analyteCount";

/// Node attributes that pin a cross-wide variable.
const PINS: [(&str, &str); 8] = [
    ("voltage", "V"),
    ("separationLength", "L_sep"),
    ("detectorDistance", "x_det"),
    ("electroosmoticMobility", "mu_eo"),
    ("diffusivity", "D"),
    ("concentration", "c0"),
    ("plugWidth", "w_plug"),
    ("valleyRatio", "ratio"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct ElectrophoreticCross;

/// Variables of one analyte band.
struct Analyte {
    mu: Symbol,
    v: Symbol,
    tpeak: Symbol,
    cpeak: Symbol,
    d2: Symbol,
}

impl Analyte {
    fn new(node: &str, index: usize) -> Result<Self, CodegenError> {
        Ok(Self {
            mu: entity_var(node, &format!("mu_{index}"))?,
            v: entity_var(node, &format!("v_{index}"))?,
            tpeak: entity_var(node, &format!("tpeak_{index}"))?,
            cpeak: entity_var(node, &format!("cpeak_{index}"))?,
            d2: entity_var(node, &format!("d2_{index}"))?,
        })
    }
}

/// Cross-wide variables plus the band model built from them.
struct Cross {
    e: Symbol,
    voltage: Symbol,
    l_sep: Symbol,
    x_det: Symbol,
    mu_eo: Symbol,
    d: Symbol,
    c0: Symbol,
    w_plug: Symbol,
    a: Symbol,
    ratio: Symbol,
}

impl Cross {
    fn new(node: &str) -> Result<Self, CodegenError> {
        let v = |attr: &str| entity_var(node, attr);
        Ok(Self {
            e: v("E")?,
            voltage: v("V")?,
            l_sep: v("L_sep")?,
            x_det: v("x_det")?,
            mu_eo: v("mu_eo")?,
            d: v("D")?,
            c0: v("c0")?,
            w_plug: v("w_plug")?,
            a: v("A")?,
            ratio: v("ratio")?,
        })
    }

    fn symbols(&self) -> [&Symbol; 10] {
        [
            &self.e,
            &self.voltage,
            &self.l_sep,
            &self.x_det,
            &self.mu_eo,
            &self.d,
            &self.c0,
            &self.w_plug,
            &self.a,
            &self.ratio,
        ]
    }

    /// `C_k(t)`
    fn concentration(&self, velocity: &Symbol, t: &Symbol) -> Result<Expr, CodegenError> {
        let drift = qfnra::sub(var(&self.x_det), qfnra::mul(var(velocity), var(t)));
        let spread = qfnra::mul(qfnra::mul(qfnra::real(4.0)?, var(&self.d)), var(t));
        Ok(qfnra::mul(
            qfnra::mul(
                var(&self.a),
                qfnra::div(qfnra::real(1.0)?, qfnra::sqrt(var(t))),
            ),
            qfnra::exp(qfnra::neg(qfnra::div(qfnra::square(drift), spread))),
        ))
    }

    /// `g_k(t) = (x_det² − v_k²·t²) / (4·D·t²) − 1/(2t)`
    fn log_slope(&self, velocity: &Symbol, t: &Symbol) -> Result<Expr, CodegenError> {
        let numerator = qfnra::sub(
            qfnra::square(var(&self.x_det)),
            qfnra::mul(qfnra::square(var(velocity)), qfnra::square(var(t))),
        );
        let denominator = qfnra::mul(
            qfnra::mul(qfnra::real(4.0)?, var(&self.d)),
            qfnra::square(var(t)),
        );
        Ok(qfnra::sub(
            qfnra::div(numerator, denominator),
            qfnra::div(
                qfnra::real(1.0)?,
                qfnra::mul(qfnra::real(2.0)?, var(t)),
            ),
        ))
    }

    /// `g_k'(t) = 1/(2t²) − x_det²/(2·D·t³)`
    fn log_curvature(&self, t: &Symbol) -> Result<Expr, CodegenError> {
        Ok(qfnra::sub(
            qfnra::div(
                qfnra::real(1.0)?,
                qfnra::mul(qfnra::real(2.0)?, qfnra::square(var(t))),
            ),
            qfnra::div(
                qfnra::square(var(&self.x_det)),
                qfnra::mul(
                    qfnra::mul(qfnra::real(2.0)?, var(&self.d)),
                    qfnra::pow(var(t), qfnra::int(3)),
                ),
            ),
        ))
    }

    fn analyte(
        &self,
        out: &mut Vec<Expr>,
        node_name: &str,
        node: &Node,
        index: usize,
    ) -> Result<Analyte, CodegenError> {
        let k = Analyte::new(node_name, index)?;
        declare(out, [&k.mu, &k.v, &k.tpeak, &k.cpeak, &k.d2]);
        pin(out, node, node_name, &format!("mobility{index}"), &k.mu)?;

        out.push(qfnra::assert_eq(
            var(&k.v),
            qfnra::mul(qfnra::add(var(&self.mu_eo), var(&k.mu)), var(&self.e)),
        ));
        out.push(qfnra::assert_gt(var(&k.v), qfnra::zero()));

        // Peak: g_k(tpeak) = 0, rearranged to a polynomial.
        out.push(qfnra::assert_eq(
            qfnra::add(
                qfnra::mul(qfnra::square(var(&k.v)), qfnra::square(var(&k.tpeak))),
                qfnra::mul(
                    qfnra::mul(qfnra::real(2.0)?, var(&self.d)),
                    var(&k.tpeak),
                ),
            ),
            qfnra::square(var(&self.x_det)),
        ));
        out.push(qfnra::assert_gt(var(&k.tpeak), qfnra::zero()));
        out.push(qfnra::assert_eq(var(&k.d2), self.log_curvature(&k.tpeak)?));
        out.push(qfnra::assert_lt(var(&k.d2), qfnra::zero()));
        out.push(qfnra::assert_eq(
            var(&k.cpeak),
            self.concentration(&k.v, &k.tpeak)?,
        ));
        Ok(k)
    }

    fn valley(
        &self,
        out: &mut Vec<Expr>,
        node_name: &str,
        index: usize,
        first: &Analyte,
        second: &Analyte,
    ) -> Result<(), CodegenError> {
        let tfade = entity_var(node_name, &format!("tfade_{index}"))?;
        let cfade = entity_var(node_name, &format!("cfade_{index}"))?;
        declare(out, [&tfade, &cfade]);

        out.push(qfnra::assert_lt(var(&first.tpeak), var(&tfade)));
        out.push(qfnra::assert_lt(var(&tfade), var(&second.tpeak)));

        let c_i = self.concentration(&first.v, &tfade)?;
        let c_j = self.concentration(&second.v, &tfade)?;
        let g_i = self.log_slope(&first.v, &tfade)?;
        let g_j = self.log_slope(&second.v, &tfade)?;
        let curvature = self.log_curvature(&tfade)?;

        // Stationary point of the summed signal.
        out.push(qfnra::assert_eq(
            qfnra::add(
                qfnra::mul(c_i.clone(), g_i.clone()),
                qfnra::mul(c_j.clone(), g_j.clone()),
            ),
            qfnra::zero(),
        ));
        // ...which is a minimum.
        out.push(qfnra::assert_gt(
            qfnra::add(
                qfnra::mul(
                    c_i.clone(),
                    qfnra::add(curvature.clone(), qfnra::square(g_i)),
                ),
                qfnra::mul(c_j.clone(), qfnra::add(curvature, qfnra::square(g_j))),
            ),
            qfnra::zero(),
        ));
        out.push(qfnra::assert_eq(var(&cfade), qfnra::add(c_i, c_j)));
        for peak in [&first.cpeak, &second.cpeak] {
            out.push(qfnra::assert_le(
                var(&cfade),
                qfnra::mul(var(&self.ratio), var(peak)),
            ));
        }
        Ok(())
    }
}

impl ElectrophoreticCross {
    fn analyte_count(name: &str, node: &Node) -> Result<usize, CodegenError> {
        let count = node.required_integer(name, ANALYTE_COUNT)?;
        if count < 2 {
            return Err(CodegenError::schema(
                name,
                format!("`{ANALYTE_COUNT}` must be at least 2, got {count}"),
            ));
        }
        usize::try_from(count).map_err(|_| {
            CodegenError::schema(name, format!("`{ANALYTE_COUNT}` {count} is too large"))
        })
    }
}

impl Strategy for ElectrophoreticCross {
    fn name(&self) -> &str {
        "electrophoreticCross"
    }

    fn generate(
        &self,
        schematic: &Schematic,
        _params: &ProcessParameters,
        types: &TypeTable,
    ) -> Result<Vec<Expr>, CodegenError> {
        let mut out = Vec::new();
        for (name, node) in schematic.nodes_of(types, ELECTROPHORETIC_CROSS)? {
            for port in CROSS_PORTS {
                if !node.ports.contains_key(port) {
                    return Err(CodegenError::schema(name, format!("missing port `{port}`")));
                }
            }
            let count = Self::analyte_count(name, node)?;
            let cross = Cross::new(name)?;
            declare(&mut out, cross.symbols());
            for (key, attr) in PINS {
                pin(&mut out, node, name, key, &entity_var(name, attr)?)?;
            }

            for symbol in [
                &cross.e,
                &cross.voltage,
                &cross.l_sep,
                &cross.x_det,
                &cross.d,
                &cross.c0,
                &cross.w_plug,
                &cross.a,
            ] {
                out.push(qfnra::assert_gt(var(symbol), qfnra::zero()));
            }
            out.push(qfnra::assert_gt(var(&cross.ratio), qfnra::zero()));
            out.push(qfnra::assert_lt(var(&cross.ratio), qfnra::real(1.0)?));
            out.push(qfnra::assert_lt(var(&cross.x_det), var(&cross.l_sep)));
            out.push(qfnra::assert_eq(
                var(&cross.e),
                qfnra::div(var(&cross.voltage), var(&cross.l_sep)),
            ));
            out.push(qfnra::assert_eq(
                var(&cross.a),
                qfnra::div(
                    qfnra::mul(var(&cross.c0), var(&cross.w_plug)),
                    qfnra::sqrt(qfnra::mul(qfnra::real(4.0 * PI)?, var(&cross.d))),
                ),
            ));

            let analytes = (1..=count)
                .map(|i| cross.analyte(&mut out, name, node, i))
                .collect::<Result<Vec<_>, _>>()?;
            for (i, pair) in analytes.windows(2).enumerate() {
                out.push(qfnra::assert_lt(var(&pair[0].tpeak), var(&pair[1].tpeak)));
                cross.valley(&mut out, name, i + 1, &pair[0], &pair[1])?;
            }
            tracing::debug!(cross = name, analytes = count, "electrophoretic cross");
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schematic::SchematicBuilder;
    use crate::strategies::fixtures::{any_violated, assert_all_hold, params};
    use crate::types::MICROFLUIDIC_PORT;
    use microflow_smtlib::Bindings;
    use rustc_hash::FxHashSet;

    const X_DET: f64 = 1.0;
    const DIFFUSIVITY: f64 = 0.001;
    const MOBILITIES: [f64; 3] = [1.0, 0.5, 0.25];

    fn cross(count: i64) -> Schematic {
        let mut builder = SchematicBuilder::new("ce").node("x", ELECTROPHORETIC_CROSS);
        for port in CROSS_PORTS {
            builder = builder.port("x", port, MICROFLUIDIC_PORT);
        }
        builder
            .node_attribute("x", ANALYTE_COUNT, count)
            .build()
            .unwrap()
    }

    fn generate(schematic: &Schematic) -> Result<Vec<Expr>, CodegenError> {
        ElectrophoreticCross.generate(schematic, &params(), &TypeTable::microfluidic())
    }

    fn band(a: f64, v: f64, t: f64) -> f64 {
        a * (1.0 / t.sqrt()) * (-(X_DET - v * t).powi(2) / (4.0 * DIFFUSIVITY * t)).exp()
    }

    fn slope(v: f64, t: f64) -> f64 {
        (X_DET.powi(2) - v.powi(2) * t.powi(2)) / (4.0 * DIFFUSIVITY * t.powi(2)) - 1.0 / (2.0 * t)
    }

    fn curvature(t: f64) -> f64 {
        1.0 / (2.0 * t.powi(2)) - X_DET.powi(2) / (2.0 * DIFFUSIVITY * t.powi(3))
    }

    /// Root of `v²t² + 2Dt − x² = 0`.
    fn peak_time(v: f64) -> f64 {
        let d = DIFFUSIVITY;
        (-2.0 * d + (4.0 * d * d + 4.0 * v * v * X_DET * X_DET).sqrt()) / (2.0 * v * v)
    }

    /// The valley between two peaks: where the summed slope crosses zero
    /// from below.
    fn valley_time(a: f64, vi: f64, vj: f64, from: f64, to: f64) -> f64 {
        let signal_slope = |t| band(a, vi, t) * slope(vi, t) + band(a, vj, t) * slope(vj, t);
        let steps = 10_000;
        let dt = (to - from) / steps as f64;
        let (mut lo, mut hi) = (from, to);
        for k in 0..steps {
            let t0 = from + dt * k as f64;
            let t1 = t0 + dt;
            if signal_slope(t0) < 0.0 && signal_slope(t1) >= 0.0 {
                (lo, hi) = (t0, t1);
                break;
            }
        }
        for _ in 0..200 {
            let mid = 0.5 * (lo + hi);
            if signal_slope(mid) < 0.0 {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        0.5 * (lo + hi)
    }

    fn solution() -> Bindings {
        let (voltage, l_sep, c0, w_plug, ratio) = (2.0, 2.0, 1.0, 0.01, 0.5);
        let e = voltage / l_sep;
        let a = c0 * w_plug / (4.0 * PI * DIFFUSIVITY).sqrt();
        let mut pairs = vec![
            ("x.E".to_string(), e),
            ("x.V".to_string(), voltage),
            ("x.L_sep".to_string(), l_sep),
            ("x.x_det".to_string(), X_DET),
            ("x.mu_eo".to_string(), 0.0),
            ("x.D".to_string(), DIFFUSIVITY),
            ("x.c0".to_string(), c0),
            ("x.w_plug".to_string(), w_plug),
            ("x.A".to_string(), a),
            ("x.ratio".to_string(), ratio),
        ];
        let velocities: Vec<f64> = MOBILITIES.iter().map(|mu| mu * e).collect();
        let peaks: Vec<f64> = velocities.iter().map(|&v| peak_time(v)).collect();
        for (k, (&v, &t)) in velocities.iter().zip(&peaks).enumerate() {
            let i = k + 1;
            pairs.push((format!("x.mu_{i}"), MOBILITIES[k]));
            pairs.push((format!("x.v_{i}"), v));
            pairs.push((format!("x.tpeak_{i}"), t));
            pairs.push((format!("x.cpeak_{i}"), band(a, v, t)));
            pairs.push((format!("x.d2_{i}"), curvature(t)));
        }
        for k in 0..MOBILITIES.len() - 1 {
            let (vi, vj) = (velocities[k], velocities[k + 1]);
            let t = valley_time(a, vi, vj, peaks[k], peaks[k + 1]);
            let i = k + 1;
            pairs.push((format!("x.tfade_{i}"), t));
            pairs.push((format!("x.cfade_{i}"), band(a, vi, t) + band(a, vj, t)));
        }
        pairs.into_iter().collect()
    }

    #[test]
    fn three_analytes_declare_29_variables() {
        let exprs = generate(&cross(3)).unwrap();
        let declared: FxHashSet<String> = exprs
            .iter()
            .filter(|e| e.is_declaration())
            .map(|e| e.to_string())
            .collect();
        assert_eq!(declared.len(), 29);
        assert!(declared.contains("(declare-fun x.tfade_2 () Real)"));
        assert!(!declared.contains("(declare-fun x.tfade_3 () Real)"));
    }

    #[test]
    fn separated_bands_satisfy_constraints() {
        let exprs = generate(&cross(3)).unwrap();
        assert_all_hold(&exprs, &solution());
    }

    #[test]
    fn shallow_valley_is_rejected() {
        let exprs = generate(&cross(3)).unwrap();
        let mut bindings = solution();
        let cpeak = bindings["x.cpeak_2"];
        bindings.insert("x.cfade_1".to_string(), 0.9 * cpeak);
        assert!(any_violated(&exprs, &bindings));
    }

    #[test]
    fn peak_off_the_band_maximum_is_rejected() {
        let exprs = generate(&cross(3)).unwrap();
        let mut bindings = solution();
        let t = bindings["x.tpeak_1"];
        bindings.insert("x.tpeak_1".to_string(), t * 1.01);
        assert!(any_violated(&exprs, &bindings));
    }

    #[test]
    fn attributes_pin_variables() {
        let schematic = SchematicBuilder::from_schematic(&cross(2))
            .node_attribute("x", "voltage", 1500.0)
            .node_attribute("x", "mobility2", 2e-8)
            .build()
            .unwrap();
        let text: Vec<String> = generate(&schematic)
            .unwrap()
            .iter()
            .map(Expr::to_string)
            .collect();
        assert!(text.contains(&"(assert (= x.V 1500.0))".to_string()));
        assert!(text.contains(&"(assert (= x.mu_2 0.00000002))".to_string()));
    }

    #[test]
    fn schema_requirements() {
        assert_eq!(
            generate(&cross(1)),
            Err(CodegenError::schema(
                "x",
                "`analyteCount` must be at least 2, got 1"
            ))
        );

        let missing_port = SchematicBuilder::new("ce")
            .node("x", ELECTROPHORETIC_CROSS)
            .port("x", "injectionIn", MICROFLUIDIC_PORT)
            .port("x", "injectionOut", MICROFLUIDIC_PORT)
            .port("x", "separationIn", MICROFLUIDIC_PORT)
            .build()
            .unwrap();
        assert_eq!(
            generate(&missing_port),
            Err(CodegenError::schema("x", "missing port `separationOut`"))
        );

        let real_count = SchematicBuilder::from_schematic(&cross(3))
            .node_attribute("x", ANALYTE_COUNT, 3.0)
            .build()
            .unwrap();
        assert!(matches!(
            generate(&real_count),
            Err(CodegenError::SchemaMismatch { .. })
        ));
    }
}
