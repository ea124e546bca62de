//! The document: arenas of every node plus type lookup.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::base::SourceId;

use super::declaration::{Factory, File, Identifier, Import, Specimen};
use super::enumeration::Enumeration;
use super::ids::{
    EnumerationId, FactoryId, IdentifierId, InterfaceId, SpecimenId, StructureId, TemplateId,
};
use super::interface::Interface;
use super::object::Name;
use super::package::Package;
use super::structure::Structure;
use super::types::{Builtin, KindClass, Literal, TemplateInstance, TemplateKind, TypeRef};

/// A registered top-level declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Declaration {
    Structure(StructureId),
    Enumeration(EnumerationId),
    Identifier(IdentifierId),
    Specimen(SpecimenId),
    Interface(InterfaceId),
    Factory(FactoryId),
}

impl Declaration {
    /// The type this declaration introduces; interfaces and factories are
    /// not types.
    pub fn as_type(self) -> Option<TypeRef> {
        match self {
            Declaration::Structure(id) => Some(TypeRef::Structure(id)),
            Declaration::Enumeration(id) => Some(TypeRef::Enumeration(id)),
            Declaration::Identifier(id) => Some(TypeRef::Identifier(id)),
            Declaration::Specimen(id) => Some(TypeRef::Specimen(id)),
            Declaration::Interface(_) | Declaration::Factory(_) => None,
        }
    }
}

/// Arena lengths at some point of parsing; see [`Document::rollback`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Checkpoint {
    structures: usize,
    enumerations: usize,
    identifiers: usize,
    specimens: usize,
    interfaces: usize,
    factories: usize,
    templates: usize,
}

/// The model of one import closure.
///
/// Nodes live in per-kind arenas addressed by typed ids. Being in an arena
/// does not make a node visible to lookup: only [`Document::register`]ed
/// declarations are found by [`Document::find_type`] and listed by
/// [`Document::declarations`].
#[derive(Debug, Default)]
pub struct Document {
    name: Option<SmolStr>,
    source: Option<Arc<SourceId>>,
    main_file: Option<File>,
    package: Option<Arc<Package>>,
    imports: Vec<Import>,

    structures: Vec<Structure>,
    enumerations: Vec<Enumeration>,
    identifiers: Vec<Identifier>,
    specimens: Vec<Specimen>,
    interfaces: Vec<Interface>,
    factories: Vec<Factory>,
    templates: Vec<TemplateInstance>,

    declarations: Vec<Declaration>,
    types_by_name: FxHashMap<SmolStr, Vec<TypeRef>>,
    template_cache: FxHashMap<(TemplateKind, TypeRef, bool), TemplateId>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // document level
    // ------------------------------------------------------------------

    /// Name of the root source without its extension.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn source(&self) -> Option<&Arc<SourceId>> {
        self.source.as_ref()
    }

    pub fn main_file(&self) -> Option<&File> {
        self.main_file.as_ref()
    }

    /// Package of the root source.
    pub fn package(&self) -> Option<&Arc<Package>> {
        self.package.as_ref()
    }

    /// Every import statement of every parsed source, in parse order.
    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    pub(crate) fn set_main_file(&mut self, source: Option<Arc<SourceId>>, file: File) {
        self.name = source.as_ref().map(|s| strip_extension(s.original()));
        self.source = source;
        self.main_file = Some(file);
    }

    pub(crate) fn set_package(&mut self, package: Arc<Package>) {
        self.package = Some(package);
    }

    pub(crate) fn add_import(&mut self, import: Import) {
        self.imports.push(import);
    }

    // ------------------------------------------------------------------
    // arenas
    // ------------------------------------------------------------------

    pub fn structure(&self, id: StructureId) -> &Structure {
        &self.structures[id.index()]
    }

    pub fn enumeration(&self, id: EnumerationId) -> &Enumeration {
        &self.enumerations[id.index()]
    }

    pub fn identifier(&self, id: IdentifierId) -> &Identifier {
        &self.identifiers[id.index()]
    }

    pub fn specimen(&self, id: SpecimenId) -> &Specimen {
        &self.specimens[id.index()]
    }

    pub fn interface(&self, id: InterfaceId) -> &Interface {
        &self.interfaces[id.index()]
    }

    pub fn factory(&self, id: FactoryId) -> &Factory {
        &self.factories[id.index()]
    }

    pub fn template(&self, id: TemplateId) -> &TemplateInstance {
        &self.templates[id.index()]
    }

    pub(crate) fn structure_mut(&mut self, id: StructureId) -> &mut Structure {
        &mut self.structures[id.index()]
    }

    pub(crate) fn enumeration_mut(&mut self, id: EnumerationId) -> &mut Enumeration {
        &mut self.enumerations[id.index()]
    }

    pub(crate) fn identifier_mut(&mut self, id: IdentifierId) -> &mut Identifier {
        &mut self.identifiers[id.index()]
    }

    pub(crate) fn specimen_mut(&mut self, id: SpecimenId) -> &mut Specimen {
        &mut self.specimens[id.index()]
    }

    pub(crate) fn interface_mut(&mut self, id: InterfaceId) -> &mut Interface {
        &mut self.interfaces[id.index()]
    }

    pub(crate) fn factory_mut(&mut self, id: FactoryId) -> &mut Factory {
        &mut self.factories[id.index()]
    }

    pub(crate) fn template_mut(&mut self, id: TemplateId) -> &mut TemplateInstance {
        &mut self.templates[id.index()]
    }

    pub(crate) fn insert_structure(&mut self, structure: Structure) -> StructureId {
        self.structures.push(structure);
        StructureId::from(self.structures.len() - 1)
    }

    pub(crate) fn insert_enumeration(&mut self, enumeration: Enumeration) -> EnumerationId {
        self.enumerations.push(enumeration);
        EnumerationId::from(self.enumerations.len() - 1)
    }

    pub(crate) fn insert_identifier(&mut self, identifier: Identifier) -> IdentifierId {
        self.identifiers.push(identifier);
        IdentifierId::from(self.identifiers.len() - 1)
    }

    pub(crate) fn insert_specimen(&mut self, specimen: Specimen) -> SpecimenId {
        self.specimens.push(specimen);
        SpecimenId::from(self.specimens.len() - 1)
    }

    pub(crate) fn insert_interface(&mut self, interface: Interface) -> InterfaceId {
        self.interfaces.push(interface);
        InterfaceId::from(self.interfaces.len() - 1)
    }

    pub(crate) fn insert_factory(&mut self, factory: Factory) -> FactoryId {
        self.factories.push(factory);
        FactoryId::from(self.factories.len() - 1)
    }

    /// Id the next inserted enumeration will get.
    pub(crate) fn next_enumeration_id(&self) -> EnumerationId {
        EnumerationId::from(self.enumerations.len())
    }

    pub(crate) fn next_structure_id(&self) -> StructureId {
        StructureId::from(self.structures.len())
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            structures: self.structures.len(),
            enumerations: self.enumerations.len(),
            identifiers: self.identifiers.len(),
            specimens: self.specimens.len(),
            interfaces: self.interfaces.len(),
            factories: self.factories.len(),
            templates: self.templates.len(),
        }
    }

    /// Drop every node inserted after `checkpoint`.
    ///
    /// Only unregistered nodes may be rolled back: registration happens
    /// after a declaration is complete and validated.
    pub(crate) fn rollback(&mut self, checkpoint: Checkpoint) {
        self.structures.truncate(checkpoint.structures);
        self.enumerations.truncate(checkpoint.enumerations);
        self.identifiers.truncate(checkpoint.identifiers);
        self.specimens.truncate(checkpoint.specimens);
        self.interfaces.truncate(checkpoint.interfaces);
        self.factories.truncate(checkpoint.factories);
        self.templates.truncate(checkpoint.templates);
        self.template_cache
            .retain(|_, id| id.index() < checkpoint.templates);
    }

    // ------------------------------------------------------------------
    // declarations
    // ------------------------------------------------------------------

    /// Make a completed declaration visible to lookup.
    ///
    /// No uniqueness check happens here; duplicates are reported by the
    /// duplicate-declaration validator.
    pub(crate) fn register(&mut self, declaration: Declaration) {
        if let Some(ty) = declaration.as_type() {
            let name = self.declaration_name(declaration).value.clone();
            self.types_by_name.entry(name).or_default().push(ty);
        }
        self.declarations.push(declaration);
    }

    /// Withdraw a declaration that failed a check after registration.
    ///
    /// Its node stays in the arena, so types already bound to it remain
    /// valid; later lookups no longer find it.
    pub(crate) fn unregister(&mut self, declaration: Declaration) {
        self.declarations.retain(|d| *d != declaration);
        if let Some(ty) = declaration.as_type() {
            let name = self.declaration_name(declaration).value.clone();
            if let Some(candidates) = self.types_by_name.get_mut(&name) {
                candidates.retain(|candidate| *candidate != ty);
            }
        }
    }

    pub fn is_registered(&self, declaration: Declaration) -> bool {
        self.declarations.contains(&declaration)
    }

    /// Registered top-level declarations in registration order.
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn declaration_name(&self, declaration: Declaration) -> &Name {
        match declaration {
            Declaration::Structure(id) => &self.structure(id).name,
            Declaration::Enumeration(id) => &self.enumeration(id).name,
            Declaration::Identifier(id) => &self.identifier(id).name,
            Declaration::Specimen(id) => &self.specimen(id).name,
            Declaration::Interface(id) => &self.interface(id).name,
            Declaration::Factory(id) => &self.factory(id).name,
        }
    }

    pub fn declaration_package(&self, declaration: Declaration) -> Option<&Arc<Package>> {
        match declaration {
            Declaration::Structure(id) => self.structure(id).package.as_ref(),
            Declaration::Enumeration(id) => self.enumeration(id).package.as_ref(),
            Declaration::Identifier(id) => self.identifier(id).package.as_ref(),
            Declaration::Specimen(id) => self.specimen(id).package.as_ref(),
            Declaration::Interface(id) => self.interface(id).package.as_ref(),
            Declaration::Factory(id) => self.factory(id).package.as_ref(),
        }
    }

    /// Registered declarations of one kind, for consumers that iterate a
    /// single family.
    pub fn structures(&self) -> impl Iterator<Item = StructureId> + '_ {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::Structure(id) => Some(*id),
            _ => None,
        })
    }

    pub fn enumerations(&self) -> impl Iterator<Item = EnumerationId> + '_ {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::Enumeration(id) => Some(*id),
            _ => None,
        })
    }

    pub fn interfaces(&self) -> impl Iterator<Item = InterfaceId> + '_ {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::Interface(id) => Some(*id),
            _ => None,
        })
    }

    pub fn factories(&self) -> impl Iterator<Item = FactoryId> + '_ {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::Factory(id) => Some(*id),
            _ => None,
        })
    }

    /// Find a registered declaration by name, any kind.
    pub fn find_declaration(&self, name: &str) -> Option<Declaration> {
        self.declarations
            .iter()
            .copied()
            .find(|d| self.declaration_name(*d) == name)
    }

    pub fn find_structure(&self, name: &str) -> Option<StructureId> {
        self.structures().find(|id| self.structure(*id).name == name)
    }

    pub fn find_enumeration(&self, name: &str) -> Option<EnumerationId> {
        self.enumerations()
            .find(|id| self.enumeration(*id).name == name)
    }

    // ------------------------------------------------------------------
    // type lookup
    // ------------------------------------------------------------------

    /// Resolve a type name.
    ///
    /// Lookup order: builtin keywords, nested enumerations of `scope`
    /// declared so far, registered types of `package`, any registered type
    /// of that name, and finally a dotted `path` naming a package (short or
    /// levels path) or an enclosing structure.
    pub fn find_type<S: AsRef<str>>(
        &self,
        package: Option<&Package>,
        path: &[S],
        scope: Option<StructureId>,
        name: &str,
    ) -> Option<TypeRef> {
        if path.is_empty() {
            if let Some(builtin) = Builtin::from_keyword(name) {
                return Some(TypeRef::Builtin(builtin));
            }
            if let Some(scope) = scope {
                let nested = self
                    .structure(scope)
                    .nested_enumerations()
                    .find(|id| self.enumeration(*id).name == name);
                if let Some(id) = nested {
                    return Some(TypeRef::Enumeration(id));
                }
            }
            let candidates = self.types_by_name.get(name)?;
            return candidates
                .iter()
                .copied()
                .find(|ty| Package::same(self.type_package(*ty).map(Arc::as_ref), package))
                .or_else(|| candidates.first().copied());
        }

        let in_package = self.types_by_name.get(name).and_then(|candidates| {
            candidates.iter().copied().find(|ty| {
                self.type_package(*ty)
                    .is_some_and(|p| p.matches(path))
            })
        });
        if in_package.is_some() {
            return in_package;
        }

        // Outer.Inner: nested enumeration of a structure
        let (outer, prefix) = path.split_last()?;
        let outer = self
            .find_type(package, prefix, None, outer.as_ref())?
            .as_structure()?;
        self.structure(outer)
            .nested_enumerations()
            .find(|id| self.enumeration(*id).name == name)
            .map(TypeRef::Enumeration)
    }

    /// Recognize `reference` and `vector`.
    pub fn find_unfinished_unary_template(&self, name: &str) -> Option<TemplateKind> {
        TemplateKind::from_keyword(name)
    }

    /// Bind `template` to `parameter`.
    ///
    /// Bound instances are shared: asking twice for `vector<Point>` yields
    /// the same id. Instances whose parameter is still pending are never
    /// shared.
    pub(crate) fn instantiate(
        &mut self,
        template: TemplateKind,
        parameter: Option<TypeRef>,
        weak: bool,
    ) -> TemplateId {
        if let Some(parameter) = parameter {
            if let Some(id) = self.template_cache.get(&(template, parameter, weak)) {
                return *id;
            }
        }
        self.templates.push(TemplateInstance {
            template,
            parameter,
            weak,
        });
        let id = TemplateId::from(self.templates.len() - 1);
        if let Some(parameter) = parameter {
            self.template_cache.insert((template, parameter, weak), id);
        }
        id
    }

    // ------------------------------------------------------------------
    // type properties
    // ------------------------------------------------------------------

    /// Display name of a type, `vector<Point>` style for templates.
    pub fn type_name(&self, ty: TypeRef) -> SmolStr {
        match ty {
            TypeRef::Builtin(b) => SmolStr::new_static(b.keyword()),
            TypeRef::Structure(id) => self.structure(id).name.value.clone(),
            TypeRef::Enumeration(id) => self.enumeration(id).name.value.clone(),
            TypeRef::Identifier(id) => self.identifier(id).name.value.clone(),
            TypeRef::Specimen(id) => self.specimen(id).name.value.clone(),
            TypeRef::Template(id) => {
                let instance = self.template(id);
                let parameter = instance
                    .parameter
                    .map_or_else(|| SmolStr::new_static("?"), |p| self.type_name(p));
                SmolStr::from(format!("{}<{}>", instance.template.keyword(), parameter))
            }
        }
    }

    pub fn type_package(&self, ty: TypeRef) -> Option<&Arc<Package>> {
        match ty {
            TypeRef::Structure(id) => self.structure(id).package.as_ref(),
            TypeRef::Enumeration(id) => self.enumeration(id).package.as_ref(),
            TypeRef::Identifier(id) => self.identifier(id).package.as_ref(),
            TypeRef::Specimen(id) => self.specimen(id).package.as_ref(),
            TypeRef::Builtin(_) | TypeRef::Template(_) => None,
        }
    }

    /// Literal class of a type; `None` while it depends on an unbound
    /// parameter.
    pub fn literal(&self, ty: TypeRef) -> Option<Literal> {
        match ty {
            TypeRef::Builtin(b) => Some(b.literal()),
            TypeRef::Structure(_) => Some(Literal::Structure),
            TypeRef::Enumeration(_) => Some(Literal::Identifier),
            TypeRef::Identifier(id) => self.literal(self.identifier(id).parameter?),
            TypeRef::Specimen(id) => self.literal(self.specimen(id).parameter?),
            TypeRef::Template(id) => Some(self.template(id).template.literal()),
        }
    }

    pub fn kind_class(&self, ty: TypeRef) -> KindClass {
        match ty {
            TypeRef::Builtin(b) => b.kind_class(),
            _ => KindClass::Object,
        }
    }

    /// Whether every type reachable from `ty` is bound.
    pub fn is_finished(&self, ty: TypeRef) -> bool {
        match ty {
            TypeRef::Template(id) => self
                .template(id)
                .parameter
                .is_some_and(|p| self.is_finished(p)),
            _ => true,
        }
    }
}

fn strip_extension(original: &str) -> SmolStr {
    let file_start = original.rfind(['/', '\\']).map_or(0, |i| i + 1);
    match original[file_start..].rfind('.') {
        Some(dot) if dot > 0 => SmolStr::new(&original[..file_start + dot]),
        _ => SmolStr::new(original),
    }
}
