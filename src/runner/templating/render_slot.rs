use crate::runner::templating::view::View;
use std::cell::RefCell;
use std::rc::Rc;

/// The ordered list of views a controller has attached; stands in for the
/// controller's DOM location.
#[derive(Clone, Default)]
pub struct RenderSlot {
    views: Rc<RefCell<Vec<Rc<View>>>>,
}

impl RenderSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn views(&self) -> Vec<Rc<View>> {
        self.views.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.views.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.borrow().is_empty()
    }

    pub fn contains(&self, view: &Rc<View>) -> bool {
        self.views.borrow().iter().any(|v| Rc::ptr_eq(v, view))
    }

    /// Makes `next` the attached views, in that order.
    pub fn reconcile(&self, next: Vec<Rc<View>>) {
        let previous = self.views.replace(next);
        for v in previous {
            if !self.contains(&v) {
                v.set_attached(false);
            }
        }
        for v in self.views.borrow().iter() {
            v.set_attached(true);
        }
    }

    pub fn text_content(&self) -> String {
        self.views
            .borrow()
            .iter()
            .map(|v| v.text_content())
            .collect()
    }
}
