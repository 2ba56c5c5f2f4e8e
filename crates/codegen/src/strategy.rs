//! Strategy framework.
//!
//! A strategy turns one slice of the schematic into solver statements. Sets
//! of strategies compose by concatenation, and a translation unit caches the
//! last successful output of one strategy.

use microflow_smtlib::Expr;

use crate::error::CodegenError;
use crate::params::ProcessParameters;
use crate::schematic::Schematic;
use crate::types::TypeTable;

/// Generates declarations and assertions for part of a schematic.
pub trait Strategy {
    fn name(&self) -> &str;

    fn generate(
        &self,
        schematic: &Schematic,
        params: &ProcessParameters,
        types: &TypeTable,
    ) -> Result<Vec<Expr>, CodegenError>;
}

impl<S: Strategy + ?Sized> Strategy for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn generate(
        &self,
        schematic: &Schematic,
        params: &ProcessParameters,
        types: &TypeTable,
    ) -> Result<Vec<Expr>, CodegenError> {
        (**self).generate(schematic, params, types)
    }
}

/// An ordered group of strategies whose outputs are concatenated.
pub struct StrategySet {
    name: String,
    members: Vec<Box<dyn Strategy>>,
}

impl StrategySet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Append a member.
    pub fn with(mut self, strategy: impl Strategy + 'static) -> Self {
        self.members.push(Box::new(strategy));
        self
    }

    pub fn push(&mut self, strategy: Box<dyn Strategy>) {
        self.members.push(strategy);
    }

    /// Member names in generation order.
    pub fn member_names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl Strategy for StrategySet {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(
        &self,
        schematic: &Schematic,
        params: &ProcessParameters,
        types: &TypeTable,
    ) -> Result<Vec<Expr>, CodegenError> {
        let mut exprs = Vec::new();
        for member in &self.members {
            let generated = member.generate(schematic, params, types)?;
            tracing::debug!(
                set = %self.name,
                strategy = member.name(),
                count = generated.len(),
                "generated constraints"
            );
            exprs.extend(generated);
        }
        Ok(exprs)
    }
}

impl std::fmt::Debug for StrategySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategySet")
            .field("name", &self.name)
            .field("members", &self.member_names())
            .finish()
    }
}

/// A strategy plus the cached result of its last successful translation.
pub struct TranslationUnit {
    strategy: Box<dyn Strategy>,
    cache: Vec<Expr>,
    valid: bool,
}

impl TranslationUnit {
    pub fn new(strategy: impl Strategy + 'static) -> Self {
        Self {
            strategy: Box::new(strategy),
            cache: Vec::new(),
            valid: false,
        }
    }

    pub fn name(&self) -> &str {
        self.strategy.name()
    }

    /// Regenerate, replacing the cache. On failure the cache stays invalid.
    pub fn translate(
        &mut self,
        schematic: &Schematic,
        params: &ProcessParameters,
        types: &TypeTable,
    ) -> Result<&[Expr], CodegenError> {
        self.invalidate();
        self.cache = self.strategy.generate(schematic, params, types)?;
        self.valid = true;
        tracing::debug!(
            strategy = self.strategy.name(),
            count = self.cache.len(),
            "translation cached"
        );
        Ok(&self.cache)
    }

    /// Output of the last successful `translate`.
    pub fn cached(&self) -> Result<&[Expr], CodegenError> {
        if self.valid {
            Ok(&self.cache)
        } else {
            Err(CodegenError::CacheNotReady(self.strategy.name().to_string()))
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn invalidate(&mut self) {
        self.valid = false;
        self.cache.clear();
    }
}

impl std::fmt::Debug for TranslationUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationUnit")
            .field("strategy", &self.strategy.name())
            .field("cached", &self.cache.len())
            .field("valid", &self.valid)
            .finish()
    }
}
