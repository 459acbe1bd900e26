use crate::schema::Name;
use crate::view::ViewName;

/// A caller's ad-hoc serialization options for a single call.
///
/// Requests never change stored configuration; they only shape one call.
///
/// # Example
/// ```rust
/// use encodable::SerializationRequest;
///
/// let request = SerializationRequest::new()
///     .view("admin")
///     .except(["email"])
///     .include_with("permissions", SerializationRequest::new().methods(["label"]));
///
/// assert_eq!(request.view_name().map(|v| v.as_str()), Some("admin"));
/// assert_eq!(request.includes().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SerializationRequest {
    view: Option<ViewName>,
    only: Option<Vec<Name>>,
    except: Vec<Name>,
    include: Vec<Include>,
    methods: Vec<Name>,
    strict: Option<bool>,
    /// Exclusions cascaded from a parent object.
    inherited_except: Vec<Name>,
}

/// A relation requested by the caller, optionally with its own nested options.
#[derive(Debug, Clone, PartialEq)]
pub struct Include {
    name: Name,
    request: Option<Box<SerializationRequest>>,
}

impl Include {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn request(&self) -> Option<&SerializationRequest> {
        self.request.as_deref()
    }
}

impl SerializationRequest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects a named view instead of the registry's default view.
    #[must_use]
    pub fn view(mut self, view: impl Into<ViewName>) -> Self {
        self.view = Some(view.into());
        self
    }

    /// Restricts top-level keys to `names`, bypassing the view's whitelist.
    #[must_use]
    pub fn only<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Name>,
    {
        let only = self.only.get_or_insert_with(Vec::new);
        extend_unique(only, names);
        self
    }

    /// Excludes `names` at this level. Names the model does not declare visible
    /// also cascade into related objects.
    #[must_use]
    pub fn except<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Name>,
    {
        extend_unique(&mut self.except, names);
        self
    }

    /// Adds callable properties to the output.
    #[must_use]
    pub fn methods<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Name>,
    {
        extend_unique(&mut self.methods, names);
        self
    }

    /// Includes a relation using the cascaded options only.
    #[must_use]
    pub fn include(self, name: impl Into<Name>) -> Self {
        self.push_include(name.into(), None)
    }

    /// Includes a relation with its own nested options.
    #[must_use]
    pub fn include_with(self, name: impl Into<Name>, request: Self) -> Self {
        self.push_include(name.into(), Some(Box::new(request)))
    }

    /// Overrides the registry's strict mode for this call and the relations below it.
    #[must_use]
    pub const fn strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }

    #[must_use]
    pub const fn view_name(&self) -> Option<&ViewName> {
        self.view.as_ref()
    }

    #[must_use]
    pub fn only_names(&self) -> Option<&[Name]> {
        self.only.as_deref()
    }

    #[must_use]
    pub fn except_names(&self) -> &[Name] {
        &self.except
    }

    #[must_use]
    pub fn method_names(&self) -> &[Name] {
        &self.methods
    }

    #[must_use]
    pub fn includes(&self) -> &[Include] {
        &self.include
    }

    #[must_use]
    pub const fn strict_mode(&self) -> Option<bool> {
        self.strict
    }

    #[must_use]
    pub fn inherited_except(&self) -> &[Name] {
        &self.inherited_except
    }

    /// Builds the request for a related object: the caller's nested options (if any)
    /// plus the exclusions cascaded from the parent.
    pub(crate) fn nested(
        explicit: Option<&Self>,
        inherited_except: Vec<Name>,
        strict: bool,
    ) -> Self {
        let mut nested = explicit.cloned().unwrap_or_default();
        nested.inherited_except = inherited_except;
        nested.strict = nested.strict.or(Some(strict));
        nested
    }

    fn push_include(mut self, name: Name, request: Option<Box<Self>>) -> Self {
        if let Some(existing) = self.include.iter_mut().find(|i| i.name == name) {
            if request.is_some() {
                existing.request = request;
            }
        } else {
            self.include.push(Include { name, request });
        }
        self
    }
}

fn extend_unique<I, N>(target: &mut Vec<Name>, names: I)
where
    I: IntoIterator<Item = N>,
    N: Into<Name>,
{
    for name in names {
        let name = name.into();
        if !target.contains(&name) {
            target.push(name);
        }
    }
}
