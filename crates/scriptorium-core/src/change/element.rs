use crate::{
    change::{ActionInfo, ChangeError, ChangeScope},
    document::Element,
    types::ElementId,
};
use std::sync::Arc;

///
/// Keyed collection helpers
///
/// Structural edits on `Vec<T: Element>` fields. Elements are always located
/// by id when the action runs; indices are never captured at registration,
/// since earlier actions may have reordered or removed elements.
///

impl<D: 'static> ChangeScope<D> {
    /// Append a new element and return its id plus a scope over it.
    ///
    /// The id is minted now, before the edit executes, so the caller can keep
    /// registering changes against the new element.
    pub fn append_element<T, L, M>(
        &self,
        label: &str,
        list: L,
        make: M,
    ) -> (ElementId, ChangeScope<T>)
    where
        T: Element,
        L: for<'a> Fn(&'a mut D) -> &'a mut Vec<T> + Send + Sync + 'static,
        M: Fn(ElementId) -> T + Send + Sync + 'static,
    {
        let id = ElementId::generate();
        let list = Arc::new(list);
        let append = Arc::clone(&list);

        self.add(format!("{label}[+{id}]"), move |document| {
            append(document).push(make(id));
        });

        (id, self.element_in(label, list, id))
    }

    /// Scope changes to the element with `id`.
    pub fn element<T, L>(&self, label: &str, list: L, id: ElementId) -> ChangeScope<T>
    where
        T: Element,
        L: for<'a> Fn(&'a mut D) -> &'a mut Vec<T> + Send + Sync + 'static,
    {
        self.element_in(label, Arc::new(list), id)
    }

    /// Remove the element with `id`; the apply fails if it is absent.
    pub fn remove_element<T, L>(&self, label: &str, list: L, id: ElementId) -> ActionInfo
    where
        T: Element,
        L: for<'a> Fn(&'a mut D) -> &'a mut Vec<T> + Send + Sync + 'static,
    {
        let scope = self.child_path(label);

        self.try_add(format!("{label}[-{id}]"), move |document| {
            let values = list(document);
            let before = values.len();
            values.retain(|element| element.element_id() != id);

            if values.len() == before {
                return Err(ChangeError::ElementMissing {
                    scope: scope.clone(),
                    id,
                });
            }

            Ok(())
        })
    }

    /// Move the element with `id` to `index`.
    /// Out-of-bounds indices clamp to the tail.
    pub fn move_element<T, L>(
        &self,
        label: &str,
        list: L,
        id: ElementId,
        index: usize,
    ) -> ActionInfo
    where
        T: Element,
        L: for<'a> Fn(&'a mut D) -> &'a mut Vec<T> + Send + Sync + 'static,
    {
        let scope = self.child_path(label);

        self.try_add(format!("{label}[{id}]@{index}"), move |document| {
            let values = list(document);
            let Some(position) = values.iter().position(|element| element.element_id() == id)
            else {
                return Err(ChangeError::ElementMissing {
                    scope: scope.clone(),
                    id,
                });
            };

            let element = values.remove(position);
            let index = index.min(values.len());
            values.insert(index, element);

            Ok(())
        })
    }

    fn element_in<T, L>(&self, label: &str, list: Arc<L>, id: ElementId) -> ChangeScope<T>
    where
        T: Element,
        L: for<'a> Fn(&'a mut D) -> &'a mut Vec<T> + Send + Sync + 'static,
    {
        self.partial(format!("{label}[{id}]"), move |document: &mut D| {
            list(document)
                .iter_mut()
                .find(|element| element.element_id() == id)
        })
    }
}
