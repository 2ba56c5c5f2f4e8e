//! The full microfluidic strategy set over schematics and options loaded
//! from JSON.

use microflow_codegen::{
    CodegenError, ProcessParameters, Schematic, Strategy, SynthesisConfig, TranslationUnit,
    TypeTable, build_script, microfluidic,
};
use microflow_smtlib::Expr;
use rustc_hash::FxHashSet;

const CHIP: &str = r#"{
    "name": "droplets",
    "nodes": {
        "oil":   {"typeName": "fluidEntry",
                  "ports": {"out": {"typeName": "microfluidicPort"}},
                  "attributes": {"viscosity": 0.005, "pressure": 2000.0}},
        "water": {"typeName": "fluidEntry",
                  "ports": {"out": {"typeName": "microfluidicPort"}},
                  "attributes": {"viscosity": 0.001}},
        "j":     {"typeName": "tJunction",
                  "ports": {"continuous": {"typeName": "microfluidicPort"},
                            "dispersed": {"typeName": "microfluidicPort"},
                            "output": {"typeName": "microfluidicPort"}}},
        "m":     {"typeName": "controlPoint",
                  "ports": {"in": {"typeName": "microfluidicPort"},
                            "out": {"typeName": "microfluidicPort"}}},
        "drain": {"typeName": "fluidExit",
                  "ports": {"in": {"typeName": "microfluidicPort"}}},
        "ce":    {"typeName": "electrophoreticCross",
                  "ports": {"injectionIn": {"typeName": "microfluidicPort"},
                            "injectionOut": {"typeName": "microfluidicPort"},
                            "separationIn": {"typeName": "microfluidicPort"},
                            "separationOut": {"typeName": "microfluidicPort"}},
                  "attributes": {"analyteCount": 2, "voltage": 1000.0}}
    },
    "connections": {
        "cc": {"typeName": "microfluidicChannel",
               "from": {"node": "oil", "port": "out"}, "to": {"node": "j", "port": "continuous"},
               "attributes": {"height": 0.0001}},
        "cd": {"typeName": "microfluidicChannel",
               "from": {"node": "water", "port": "out"}, "to": {"node": "j", "port": "dispersed"}},
        "co": {"typeName": "microfluidicChannel",
               "from": {"node": "j", "port": "output"}, "to": {"node": "m", "port": "in"}},
        "cx": {"typeName": "microfluidicChannel",
               "from": {"node": "m", "port": "out"}, "to": {"node": "drain", "port": "in"},
               "attributes": {"maxLength": 0.02}}
    },
    "constraints": {
        "drop": {"typeName": "dropletVolumeConstraint",
                 "attributes": {"junction": "j", "volume": 1e-12}}
    }
}"#;

const PARAMS: &str = r#"{
    "minNodeDistance": 0.001,
    "minChannelLength": 0.0005,
    "maxChipX": 0.05,
    "maxChipY": 0.04,
    "criticalCrossingAngle": 0.5
}"#;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Operand symbols of `expr`, skipping operator heads.
fn collect_operands(expr: &Expr, out: &mut FxHashSet<String>) {
    match expr {
        Expr::Symbol(symbol) => {
            out.insert(symbol.as_str().to_string());
        }
        Expr::List(items) => {
            let operands = match items.first() {
                Some(Expr::Symbol(_)) => &items[1..],
                _ => &items[..],
            };
            for item in operands {
                collect_operands(item, out);
            }
        }
        Expr::Numeral(_) | Expr::Decimal(_) => {}
    }
}

fn script_lines(config: &SynthesisConfig) -> Vec<String> {
    let chip = Schematic::from_json(CHIP).unwrap();
    let params = ProcessParameters::from_json(PARAMS).unwrap();
    let mut unit = TranslationUnit::new(microfluidic(config));
    build_script(&mut unit, &chip, &params, &TypeTable::microfluidic())
        .unwrap()
        .lines()
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn every_referenced_symbol_is_declared() {
    let chip = Schematic::from_json(CHIP).unwrap();
    let params = ProcessParameters::from_json(PARAMS).unwrap();
    let mut unit = TranslationUnit::new(microfluidic(&SynthesisConfig::default()));
    let script = build_script(&mut unit, &chip, &params, &TypeTable::microfluidic()).unwrap();

    let declared: FxHashSet<String> = script
        .declared_symbols()
        .map(|s| s.as_str().to_string())
        .collect();
    let mut referenced = FxHashSet::default();
    for expr in script.exprs().iter().filter(|e| e.is_assertion()) {
        collect_operands(expr, &mut referenced);
    }
    let mut missing: Vec<&String> = referenced.difference(&declared).collect();
    missing.sort();
    assert!(missing.is_empty(), "undeclared symbols: {missing:?}");

    for symbol in ["j.v_output", "drop.volume", "ce.mobility2", "cx.length", "m.x"] {
        assert!(declared.contains(symbol), "{symbol} not declared");
    }
}

#[test]
fn attributes_from_json_are_pinned() {
    let lines = script_lines(&SynthesisConfig::default());
    for expected in [
        "(assert (= cc.height 0.0001))",
        "(assert (= cc.viscosity 0.005))",
        "(assert (= oil.out.pressure 2000.0))",
        "(assert (<= cx.length 0.02))",
        "(assert (= ce.V 1000.0))",
        "(assert (= drop.volume 0.000000000001))",
        "(assert (= drop.volume j.v_output))",
    ] {
        assert!(lines.iter().any(|l| l == expected), "missing {expected}");
    }
}

#[test]
fn length_rule_from_config_changes_channel_lengths() {
    let euclidean = script_lines(&SynthesisConfig::default());
    assert!(euclidean.iter().any(|l| l.starts_with("(assert (= (^ cx.length 2)")));
    assert!(!euclidean.iter().any(|l| l.starts_with("(assert (= cx.length (+ (ite")));

    let config = SynthesisConfig::from_json(
        r#"{"placement": {"lengthRule": "manhattan", "chipArea": "unbounded"}}"#,
    )
    .unwrap();
    let manhattan = script_lines(&config);
    assert!(manhattan.iter().any(|l| l.starts_with("(assert (= cx.length (+ (ite")));
    assert!(!manhattan.iter().any(|l| l == "(assert (<= m.x 0.05))"));
    assert!(euclidean.iter().any(|l| l == "(assert (<= m.x 0.05))"));
}

#[test]
fn strategy_set_is_deterministic() {
    let chip = Schematic::from_json(CHIP).unwrap();
    let params = ProcessParameters::from_json(PARAMS).unwrap();
    let types = TypeTable::microfluidic();
    let strategy = microfluidic(&SynthesisConfig::default());
    let first = strategy.generate(&chip, &params, &types).unwrap();
    let second = strategy.generate(&chip, &params, &types).unwrap();
    assert_eq!(first, second);
}

#[test]
fn json_round_trip_preserves_the_script() {
    let chip = Schematic::from_json(CHIP).unwrap();
    let reloaded = Schematic::from_json(&chip.to_json().unwrap()).unwrap();
    assert_eq!(reloaded, chip);
}

#[test]
fn schema_faults_surface_from_generation() {
    let broken = CHIP.replace(r#""junction": "j""#, r#""junction": "m""#);
    let chip = Schematic::from_json(&broken).unwrap();
    let params = ProcessParameters::from_json(PARAMS).unwrap();
    let mut unit = TranslationUnit::new(microfluidic(&SynthesisConfig::default()));
    let err = build_script(&mut unit, &chip, &params, &TypeTable::microfluidic()).unwrap_err();
    assert!(matches!(err, CodegenError::SchemaMismatch { .. }));
    assert!(!unit.is_valid());
}

#[test]
fn invalid_parameters_are_rejected() {
    let err = ProcessParameters::from_json(&PARAMS.replace("0.05", "-0.05")).unwrap_err();
    assert!(matches!(err, CodegenError::InvalidParameter { .. }));
    assert!(ProcessParameters::from_json(r#"{"minNodeDistance": 0.001}"#).is_err());
}
