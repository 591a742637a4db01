//! Class models handed to contract analysis

use jmlok_ast::{ClassDecl, ClassKind, CompilationUnit, FieldDecl, MethodDecl, SmolStr, TypeRef};
use std::path::PathBuf;

/// One class (or interface) as seen by contract analysis: its declaration
/// plus the supertypes resolved to fully-qualified names.
#[derive(Debug, Clone)]
pub struct ClassModel {
    /// Fully-qualified name, e.g. `bank.Account`
    pub name: SmolStr,
    pub package: SmolStr,
    pub decl: ClassDecl,
    /// Directly implemented (or, for interfaces, extended) interfaces
    pub interfaces: Vec<SmolStr>,
    /// Superclass, only when its source is part of the analyzed tree
    pub superclass: Option<SmolStr>,
    /// File the model was read from
    pub path: PathBuf,
    source: String,
}

impl ClassModel {
    /// Build the model for `name` out of a parsed file. `exists` tells
    /// whether a fully-qualified class has a source file in the tree.
    ///
    /// Returns `None` when the file does not declare the class.
    pub fn from_unit(
        name: &str,
        unit: &CompilationUnit,
        source: String,
        path: PathBuf,
        exists: impl Fn(&str) -> bool,
    ) -> Option<Self> {
        let decl = unit.find_type(simple_name(name))?.clone();

        let interfaces = decl
            .implements
            .iter()
            .map(|ty| resolve_type_name(ty, unit, &exists))
            .collect();

        let superclass = decl
            .extends
            .as_ref()
            .map(|ty| resolve_type_name(ty, unit, &exists))
            .filter(|fqn| exists(fqn.as_str()));

        Some(Self {
            name: SmolStr::new(name),
            package: unit.package.clone(),
            decl,
            interfaces,
            superclass,
            path,
            source,
        })
    }

    pub fn simple_name(&self) -> &str {
        &self.decl.name.node
    }

    pub fn is_interface(&self) -> bool {
        self.decl.kind == ClassKind::Interface
    }

    pub fn fields(&self) -> &[FieldDecl] {
        &self.decl.fields
    }

    /// Methods named `name` in declaration order; `<init>` selects constructors
    pub fn methods_named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a MethodDecl> + 'a {
        self.decl.methods_named(name)
    }

    /// Full source text of a declaration, body included
    pub fn declaration_text<'a>(&'a self, method: &'a MethodDecl) -> &'a str {
        self.source
            .get(method.span.start..method.span.end)
            .unwrap_or(&method.header)
    }

    /// Text of the file the class was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Last segment of a dotted name
pub fn simple_name(fqn: &str) -> &str {
    fqn.rsplit('.').next().unwrap_or(fqn)
}

/// Everything before the last dot, empty for the default package
pub fn package_of(fqn: &str) -> &str {
    fqn.rfind('.').map_or("", |dot| &fqn[..dot])
}

/// Join a package and a simple name
pub fn qualify(package: &str, simple: &str) -> String {
    if package.is_empty() {
        simple.to_string()
    } else {
        format!("{}.{}", package, simple)
    }
}

/// Resolve a supertype reference to a fully-qualified name. Qualified names
/// are kept. Simple names go through single-type imports, then the
/// declaring package when the class is in the tree, then on-demand imports
/// whose target is in the tree, and finally default to the declaring package.
pub fn resolve_type_name(
    ty: &TypeRef,
    unit: &CompilationUnit,
    exists: impl Fn(&str) -> bool,
) -> SmolStr {
    if ty.is_qualified() {
        return ty.name.clone();
    }
    let simple = ty.name.as_str();

    if let Some(import) = unit
        .imports
        .iter()
        .find(|i| !i.on_demand && !i.is_static && i.simple_name() == simple)
    {
        return import.path.clone();
    }

    let same_package = qualify(&unit.package, simple);
    if exists(&same_package) {
        return SmolStr::new(same_package);
    }

    for import in unit.imports.iter().filter(|i| i.on_demand && !i.is_static) {
        let candidate = qualify(&import.path, simple);
        if exists(&candidate) {
            return SmolStr::new(candidate);
        }
    }

    SmolStr::new(same_package)
}
