use super::normalize_class;

use std::collections::{HashMap, HashSet};

/// An explicit declaration of a class or interface and what it inherits.
///
/// The registry has no reflection over types; the ancestry used to route
/// events comes entirely from these declarations.
///
/// ```
/// use fibre_hub::ClassDecl;
///
/// let cat = ClassDecl::class("app::Cat")
///   .extends("app::Animal")
///   .implements("app::Noisy");
/// let noisy = ClassDecl::interface("app::Noisy").extends("app::Audible");
/// # let _ = (cat, noisy);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDecl {
  name: String,
  parent: Option<String>,
  interfaces: Vec<String>,
  is_interface: bool,
}

impl ClassDecl {
  pub fn class(name: &str) -> Self {
    Self {
      name: normalize_class(name).to_owned(),
      parent: None,
      interfaces: Vec::new(),
      is_interface: false,
    }
  }

  pub fn interface(name: &str) -> Self {
    Self {
      is_interface: true,
      ..Self::class(name)
    }
  }

  /// Sets the parent class. On an interface this adds a parent interface
  /// instead, since interfaces may extend several others.
  pub fn extends(mut self, parent: &str) -> Self {
    let parent = normalize_class(parent).to_owned();
    if self.is_interface {
      self.interfaces.push(parent);
    } else {
      self.parent = Some(parent);
    }
    self
  }

  pub fn implements(mut self, interface: &str) -> Self {
    self.interfaces.push(normalize_class(interface).to_owned());
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn parent(&self) -> Option<&str> {
    self.parent.as_deref()
  }

  pub fn interfaces(&self) -> &[String] {
    &self.interfaces
  }

  pub fn is_interface(&self) -> bool {
    self.is_interface
  }
}

#[derive(Debug, Default)]
pub(crate) struct Hierarchy {
  decls: HashMap<String, ClassDecl>,
}

impl Hierarchy {
  pub(crate) fn declare(&mut self, decl: ClassDecl) {
    self.decls.insert(decl.name.clone(), decl);
  }

  pub(crate) fn declare_if_absent(&mut self, decl: ClassDecl) {
    self.decls.entry(decl.name.clone()).or_insert(decl);
  }

  /// The class, its parents root-ward, then every interface reachable from
  /// the class and its parents. Each name appears once, at its first position.
  pub(crate) fn ancestry(&self, class: &str) -> Vec<String> {
    let class = normalize_class(class);
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = vec![class.to_owned()];
    seen.insert(class);

    let mut lineage = vec![class];
    let mut current = self.parent_of(class);
    while let Some(parent) = current {
      if !seen.insert(parent) {
        break;
      }
      out.push(parent.to_owned());
      lineage.push(parent);
      current = self.parent_of(parent);
    }

    for name in lineage {
      if let Some(decl) = self.decls.get(name) {
        for interface in &decl.interfaces {
          self.collect_interface(interface, &mut seen, &mut out);
        }
      }
    }
    out
  }

  fn parent_of(&self, class: &str) -> Option<&str> {
    self.decls.get(class).and_then(|d| d.parent.as_deref())
  }

  fn collect_interface<'a>(
    &'a self,
    interface: &'a str,
    seen: &mut HashSet<&'a str>,
    out: &mut Vec<String>,
  ) {
    if !seen.insert(interface) {
      return;
    }
    out.push(interface.to_owned());
    if let Some(decl) = self.decls.get(interface) {
      for parent in &decl.interfaces {
        self.collect_interface(parent, seen, out);
      }
    }
  }
}
