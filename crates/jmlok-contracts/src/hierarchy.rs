//! Hierarchy walker
//!
//! Repeats one method-level check across a class, its interfaces, its
//! superclass chain and its separate specification file. Any level that
//! answers `true` ends the walk.

use crate::eval::is_trivially_true;
use crate::examiner::ExaminationContext;
use crate::scanner::{
    body_has_attribution_or_call, clause_mentions, discharge_constructor,
    discharge_field_declarations,
};
use indexmap::IndexSet;
use jmlok_ast::{normalize_whitespace, MethodDecl};
use jmlok_source::{ClassModel, SourceModelProvider};
use smol_str::SmolStr;
use std::sync::Arc;
use tracing::debug;

/// Method-level question asked at every level of the walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Check {
    /// Some requires clause mentions a parameter or a known field
    StrongPrecondition,
    /// No requires clause, or one that is trivially true
    RequiresTrivial,
    /// The body writes to a parameter or field, or calls a method
    Attribution,
    /// No ensures clause, or one that is trivially true
    EnsuresTrivial,
    /// Every non-primitive field ends up with a non-null value
    NullSafety,
}

impl Check {
    /// Precondition-related checks also consult interfaces and
    /// specification files
    pub fn is_precondition_related(self) -> bool {
        matches!(self, Check::StrongPrecondition | Check::RequiresTrivial)
    }
}

/// Where a class model comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Implementation,
    Specification,
}

/// Mutable state of one walk. Created fresh for every top-level check.
#[derive(Debug, Clone, Default)]
pub struct WalkState {
    /// Fields seen so far; for null safety, the fields not yet shown safe
    pub variables: IndexSet<SmolStr>,
    /// Set once the top of the superclass chain has been reached
    pub all_fields_known: bool,
    /// Classes currently on the walk stack
    active: Vec<SmolStr>,
}

impl WalkState {
    pub fn new(fields: IndexSet<SmolStr>) -> Self {
        Self {
            variables: fields,
            all_fields_known: false,
            active: Vec::new(),
        }
    }
}

/// One walk of one check
pub struct HierarchyWalker<'a, P: SourceModelProvider + ?Sized> {
    provider: &'a mut P,
    context: &'a ExaminationContext,
    check: Check,
    filter: String,
    state: WalkState,
}

impl<'a, P: SourceModelProvider + ?Sized> HierarchyWalker<'a, P> {
    pub fn new(provider: &'a mut P, context: &'a ExaminationContext, check: Check) -> Self {
        Self {
            provider,
            context,
            check,
            filter: normalize_whitespace(&context.signature_filter),
            state: WalkState::new(context.fields.clone()),
        }
    }

    /// Replace the signature filter of the context
    pub fn with_filter(mut self, filter: &str) -> Self {
        self.filter = normalize_whitespace(filter);
        self
    }

    pub fn state(&self) -> &WalkState {
        &self.state
    }

    /// Walk from the principal class of the context
    pub fn run(&mut self, method: &str) -> bool {
        let class = self.context.class_name.clone();
        self.examine(&class, method, SourceKind::Implementation)
    }

    fn examine(&mut self, class: &str, method: &str, source: SourceKind) -> bool {
        if source == SourceKind::Implementation && self.state.active.iter().any(|c| c == class) {
            debug!(class, "inheritance cycle, not descending again");
            return false;
        }

        let model = match source {
            SourceKind::Implementation => self.provider.resolve_class(class),
            SourceKind::Specification => self.provider.resolve_specification(class),
        };
        let Some(model) = model else {
            debug!(class, ?source, check = ?self.check, "class not resolvable");
            return false;
        };

        if source == SourceKind::Implementation {
            self.state.active.push(SmolStr::new(class));
        }
        let found = self.examine_model(&model, method, source);
        if source == SourceKind::Implementation {
            self.state.active.pop();
        }
        found
    }

    fn examine_model(&mut self, model: &Arc<ClassModel>, method: &str, source: SourceKind) -> bool {
        if model.name != self.context.class_name {
            self.state
                .variables
                .extend(model.decl.field_names().cloned());
        }

        if source == SourceKind::Implementation && self.examine_associated(model, method) {
            return true;
        }

        if self.check == Check::NullSafety && self.state.all_fields_known {
            discharge_field_declarations(&mut self.state.variables, &model.decl.fields);
        }

        let found = self.examine_methods(model, method);
        debug!(class = %model.name, method, check = ?self.check, found, "examined");
        found
    }

    /// Interfaces, superclass and specification counterpart of `model`
    fn examine_associated(&mut self, model: &ClassModel, method: &str) -> bool {
        let precondition = self.check.is_precondition_related();

        if precondition {
            for interface in &model.interfaces {
                if self.examine(interface, method, SourceKind::Implementation) {
                    return true;
                }
            }
        }

        match &model.superclass {
            Some(superclass) => {
                if self.examine(superclass, method, SourceKind::Implementation) {
                    return true;
                }
            }
            None => self.state.all_fields_known = true,
        }

        precondition && self.examine(&model.name, method, SourceKind::Specification)
    }

    fn examine_methods(&mut self, model: &ClassModel, method: &str) -> bool {
        let candidates = self.candidates(model, method);
        let mut found = false;
        for candidate in candidates {
            if self.check_method(candidate) {
                found = true;
                break;
            }
        }

        if self.check == Check::NullSafety {
            self.state.variables.is_empty()
        } else {
            found
        }
    }

    /// Same-named methods whose header contains the filter, in declaration
    /// order. With no match, every same-named method.
    fn candidates<'m>(&self, model: &'m ClassModel, method: &str) -> Vec<&'m MethodDecl> {
        let named: Vec<&MethodDecl> = model.methods_named(method).collect();
        if self.filter.is_empty() {
            return named;
        }

        let matching: Vec<&MethodDecl> = named
            .iter()
            .copied()
            .filter(|m| m.normalized_header().contains(self.filter.as_str()))
            .collect();
        if matching.is_empty() {
            debug!(class = %model.name, method, filter = %self.filter, "no declaration matches the signature filter");
            named
        } else {
            matching
        }
    }

    fn check_method(&mut self, method: &MethodDecl) -> bool {
        match self.check {
            Check::StrongPrecondition => {
                let params: IndexSet<SmolStr> = method.param_names().cloned().collect();
                method
                    .requires_clauses()
                    .any(|clause| clause_mentions(clause, &params, &self.state.variables))
            }
            Check::RequiresTrivial => {
                let mut clauses = method.requires_clauses().peekable();
                clauses.peek().is_none()
                    || clauses.any(|clause| is_trivially_true(&clause.condition))
            }
            Check::EnsuresTrivial => {
                let mut clauses = method.ensures_clauses().peekable();
                clauses.peek().is_none()
                    || clauses.any(|clause| is_trivially_true(&clause.condition))
            }
            Check::Attribution => {
                let params: IndexSet<SmolStr> = method.param_names().cloned().collect();
                body_has_attribution_or_call(&params, &self.state.variables, method.body.as_ref())
            }
            Check::NullSafety => {
                discharge_constructor(&mut self.state.variables, method.body.as_ref())
            }
        }
    }
}
