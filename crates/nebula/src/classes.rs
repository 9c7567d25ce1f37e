//! The class table: a registry of user-defined classes keyed by qualified
//! name (`Outer.Inner` for nested classes).
//!
//! Field defaults are stored as unevaluated expressions and evaluated at
//! construction time. Method resolution walks the parent graph depth-first
//! with a visited set, so cycles cannot loop forever.

use std::rc::Rc;

use ahash::AHashSet;
use indexmap::IndexMap;

use crate::{
    ast::{ClassDecl, Expr},
    scope::ScopeRef,
    value::Function,
};

/// A registered class: fields with optional default expressions, parents as
/// qualified names, methods, and the nested-name map visible to defaults.
#[derive(Debug)]
pub(crate) struct ClassDef {
    pub name: Rc<str>,
    pub fields: Vec<(Rc<str>, Option<Rc<Expr>>)>,
    pub parents: Vec<Rc<str>>,
    pub methods: IndexMap<String, Rc<Function>>,
    /// Simple name -> qualified name for classes nested (at any depth)
    /// inside this one; consulted when evaluating field defaults.
    pub nested: IndexMap<String, Rc<str>>,
}

#[derive(Debug, Default)]
pub(crate) struct ClassTable {
    classes: IndexMap<String, ClassDef>,
}

impl ClassTable {
    pub fn get(&self, name: &str) -> Option<&ClassDef> {
        self.classes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Registers a class declaration and, recursively, its nested classes
    /// under `Outer.Inner` qualified names. Methods capture `scope`.
    ///
    /// Returns the (qualified) name the class was registered under.
    pub fn register(&mut self, decl: &ClassDecl, scope: &ScopeRef) -> Rc<str> {
        self.register_inner(decl, None, &[], scope)
    }

    fn register_inner(
        &mut self,
        decl: &ClassDecl,
        outer: Option<&str>,
        siblings: &[String],
        scope: &ScopeRef,
    ) -> Rc<str> {
        let qualified: Rc<str> = match outer {
            Some(outer) => format!("{outer}.{}", decl.name).into(),
            None => decl.name.as_str().into(),
        };

        // A parent naming a sibling class resolves to that sibling's
        // qualified name; anything else resolves globally.
        let parents = decl
            .parents
            .iter()
            .map(|parent| -> Rc<str> {
                match outer {
                    Some(outer) if siblings.contains(parent) => format!("{outer}.{parent}").into(),
                    _ => parent.as_str().into(),
                }
            })
            .collect();

        let methods = decl
            .methods
            .iter()
            .map(|method| {
                let function = Rc::new(Function {
                    name: Some(Rc::from(method.name.as_str())),
                    params: method.params.clone(),
                    body: method.body.clone(),
                    scope: scope.clone(),
                });
                (method.name.clone(), function)
            })
            .collect();

        let fields = decl
            .fields
            .iter()
            .map(|(name, default)| (Rc::from(name.as_str()), default.clone()))
            .collect();

        let mut nested = IndexMap::new();
        let child_names: Vec<String> = decl.nested.iter().map(|child| child.name.clone()).collect();
        for child in &decl.nested {
            let child_qualified = self.register_inner(child, Some(&qualified), &child_names, scope);
            nested.insert(child.name.clone(), child_qualified.clone());
            // Deeper descendants stay visible by simple name too.
            if let Some(child_def) = self.get(&child_qualified) {
                let grandchildren: Vec<(String, Rc<str>)> = child_def
                    .nested
                    .iter()
                    .map(|(simple, qual)| (simple.clone(), qual.clone()))
                    .collect();
                for (simple, qual) in grandchildren {
                    nested.entry(simple).or_insert(qual);
                }
            }
        }

        self.classes.insert(
            qualified.to_string(),
            ClassDef {
                name: qualified.clone(),
                fields,
                parents,
                methods,
                nested,
            },
        );
        qualified
    }

    /// Attaches a method defined via dotted `def Class.method(...)`,
    /// creating an empty class record when the class is not yet declared.
    pub fn register_method(&mut self, class_name: &str, method_name: &str, function: Rc<Function>) {
        let entry = self.classes.entry(class_name.to_owned()).or_insert_with(|| ClassDef {
            name: Rc::from(class_name),
            fields: Vec::new(),
            parents: Vec::new(),
            methods: IndexMap::new(),
            nested: IndexMap::new(),
        });
        entry.methods.insert(method_name.to_owned(), function);
    }

    /// Resolves a method on `class` or its ancestors, depth-first in parent
    /// declaration order, visiting each class at most once.
    pub fn find_method(&self, class: &str, attr: &str) -> Option<Rc<Function>> {
        let mut visited = AHashSet::new();
        self.find_method_walk(class, attr, &mut visited)
    }

    fn find_method_walk<'a>(&'a self, class: &'a str, attr: &str, visited: &mut AHashSet<&'a str>) -> Option<Rc<Function>> {
        if !visited.insert(class) {
            return None;
        }
        let def = self.classes.get(class)?;
        if let Some(method) = def.methods.get(attr) {
            return Some(method.clone());
        }
        for parent in &def.parents {
            if let Some(method) = self.find_method_walk(parent, attr, visited) {
                return Some(method);
            }
        }
        None
    }

    /// Whether `attr` is a declared field of `class` or any ancestor.
    pub fn has_field(&self, class: &str, attr: &str) -> bool {
        let mut visited = AHashSet::new();
        self.has_field_walk(class, attr, &mut visited)
    }

    fn has_field_walk<'a>(&'a self, class: &'a str, attr: &str, visited: &mut AHashSet<&'a str>) -> bool {
        if !visited.insert(class) {
            return false;
        }
        let Some(def) = self.classes.get(class) else {
            return false;
        };
        if def.fields.iter().any(|(name, _)| name.as_ref() == attr) {
            return true;
        }
        def.parents
            .iter()
            .any(|parent| self.has_field_walk(parent, attr, visited))
    }

    /// The constructor's field list: the class's own fields first, then
    /// each ancestor's (depth-first, first declaration of a name wins), so
    /// inherited defaults initialize on construction.
    pub fn constructor_fields(&self, class: &str) -> Vec<(Rc<str>, Option<Rc<Expr>>)> {
        let mut visited = AHashSet::new();
        let mut seen_names = AHashSet::new();
        let mut fields = Vec::new();
        self.collect_fields(class, &mut visited, &mut seen_names, &mut fields);
        fields
    }

    fn collect_fields<'a>(
        &'a self,
        class: &'a str,
        visited: &mut AHashSet<&'a str>,
        seen_names: &mut AHashSet<Rc<str>>,
        fields: &mut Vec<(Rc<str>, Option<Rc<Expr>>)>,
    ) {
        if !visited.insert(class) {
            return;
        }
        let Some(def) = self.classes.get(class) else {
            return;
        };
        for (name, default) in &def.fields {
            if seen_names.insert(name.clone()) {
                fields.push((name.clone(), default.clone()));
            }
        }
        for parent in &def.parents {
            self.collect_fields(parent, visited, seen_names, fields);
        }
    }

    /// Every method and declared field name reachable from `class`, for
    /// AttributeError messages.
    pub fn available_attrs(&self, class: &str) -> Vec<String> {
        let mut visited = AHashSet::new();
        let mut names = Vec::new();
        let mut queue = vec![class.to_owned()];
        while let Some(current) = queue.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            let Some(def) = self.classes.get(&current) else {
                continue;
            };
            for method in def.methods.keys() {
                if !names.contains(method) {
                    names.push(method.clone());
                }
            }
            for (field, _) in &def.fields {
                let field = field.to_string();
                if !names.contains(&field) {
                    names.push(field);
                }
            }
            for parent in &def.parents {
                queue.push(parent.to_string());
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::FuncDecl;
    use crate::scope::Scope;

    fn decl(name: &str, parents: &[&str], fields: &[&str], nested: Vec<ClassDecl>) -> ClassDecl {
        ClassDecl {
            name: name.to_owned(),
            parents: parents.iter().map(|p| (*p).to_owned()).collect(),
            fields: fields.iter().map(|f| ((*f).to_owned(), None)).collect(),
            methods: Vec::new(),
            nested,
        }
    }

    fn method(name: &str) -> FuncDecl {
        FuncDecl {
            name: name.to_owned(),
            params: Rc::from(Vec::new()),
            body: Rc::from(Vec::new()),
        }
    }

    #[test]
    fn nested_classes_register_under_qualified_names() {
        let scope = Scope::new_root();
        let mut table = ClassTable::default();
        let inner = decl("Inner", &[], &["x"], vec![]);
        let outer = decl("Outer", &[], &[], vec![inner]);
        table.register(&outer, &scope);
        assert!(table.contains("Outer"));
        assert!(table.contains("Outer.Inner"));
        assert_eq!(
            table.get("Outer").unwrap().nested.get("Inner").map(AsRef::as_ref),
            Some("Outer.Inner")
        );
    }

    #[test]
    fn sibling_parents_rewrite_to_qualified_names() {
        let scope = Scope::new_root();
        let mut table = ClassTable::default();
        let base = decl("Base", &[], &["x"], vec![]);
        let derived = decl("Derived", &["Base"], &[], vec![]);
        let outer = decl("Outer", &[], &[], vec![base, derived]);
        table.register(&outer, &scope);
        let derived = table.get("Outer.Derived").unwrap();
        assert_eq!(derived.parents[0].as_ref(), "Outer.Base");
        assert!(table.has_field("Outer.Derived", "x"));
    }

    #[test]
    fn method_resolution_survives_parent_cycles() {
        let scope = Scope::new_root();
        let mut table = ClassTable::default();
        let mut a = decl("A", &["B"], &[], vec![]);
        a.methods.push(method("hello"));
        let b = decl("B", &["A"], &[], vec![]);
        table.register(&a, &scope);
        table.register(&b, &scope);
        assert!(table.find_method("B", "hello").is_some());
        assert!(table.find_method("B", "missing").is_none());
    }

    #[test]
    fn constructor_fields_include_ancestors_once() {
        let scope = Scope::new_root();
        let mut table = ClassTable::default();
        table.register(&decl("A", &[], &["x", "y"], vec![]), &scope);
        table.register(&decl("B", &["A"], &["y", "z"], vec![]), &scope);
        let fields = table.constructor_fields("B");
        let names: Vec<&str> = fields.iter().map(|(name, _)| name.as_ref()).collect();
        assert_eq!(names, ["y", "z", "x"]);
    }
}
