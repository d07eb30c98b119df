//! A GraphQL engine executing operations against an SDL schema with
//! registered field resolvers.

use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use apollo_compiler::Node;
use apollo_compiler::Schema;
use apollo_compiler::ast;
use apollo_compiler::parser::SourceMap;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::validation::Valid;
use displaydoc::Display;
use indexmap::IndexMap;
use thiserror::Error;
use tower::BoxError;

use super::ExecutionRequest;
use super::Executor;
use crate::graphql;
use crate::graphql::Location;
use crate::graphql::Object;
use crate::graphql::Path;
use crate::graphql::PathElement;
use crate::graphql::Value;

const TYPENAME: &str = "__typename";

type Resolver<C> = Arc<dyn Fn(ResolveInfo<'_, C>) -> Result<Value, BoxError> + Send + Sync>;

/// Errors building a [`SchemaExecutor`].
#[derive(Error, Display, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchemaError {
    /// invalid schema: {0}
    Invalid(String),
}

/// What a field resolver gets to work with.
#[non_exhaustive]
pub struct ResolveInfo<'a, C> {
    /// The value of the parent object: the root value for top-level fields.
    pub parent: &'a Value,
    /// The field arguments, with variables substituted and schema defaults applied.
    pub arguments: &'a Object,
    /// The execution context, if any.
    pub context: Option<&'a C>,
    /// The name of the object type the field belongs to.
    pub type_name: &'a str,
    /// The name of the field, not its alias.
    pub field_name: &'a str,
}

/// Executes operations against a schema.
///
/// Fields without a registered resolver read the property of the same name
/// on their parent value. Values of interface and union types must carry a
/// `__typename` naming their concrete object type.
///
/// Before anything runs, the operation is checked for unknown fields,
/// arguments, fragments, types and variables, missing required arguments and
/// variables, and selections that do not fit their field type. Any failure
/// there is reported without data.
pub struct SchemaExecutor<C = ()> {
    schema: Arc<Valid<Schema>>,
    resolvers: HashMap<String, HashMap<String, Resolver<C>>>,
}

impl<C> SchemaExecutor<C> {
    /// Parse and validate a schema.
    pub fn parse(sdl: &str) -> Result<Self, SchemaError> {
        let schema = Schema::parse_and_validate(sdl, "schema.graphql")
            .map_err(|invalid| SchemaError::Invalid(invalid.errors.to_string()))?;
        Ok(Self {
            schema: Arc::new(schema),
            resolvers: HashMap::new(),
        })
    }

    /// Register the resolver of `type_name.field_name`, replacing any previous one.
    pub fn resolver<F>(mut self, type_name: &str, field_name: &str, resolver: F) -> Self
    where
        F: Fn(ResolveInfo<'_, C>) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        if self.schema.type_field(type_name, field_name).is_err() {
            tracing::warn!(
                type_name,
                field_name,
                "registered a resolver for a field the schema does not define"
            );
        }
        self.resolvers
            .entry(type_name.to_string())
            .or_default()
            .insert(field_name.to_string(), Arc::new(resolver));
        self
    }

    /// The schema operations are executed against.
    pub fn schema(&self) -> &Valid<Schema> {
        &self.schema
    }

    fn field_resolver(&self, type_name: &str, field_name: &str) -> Option<&Resolver<C>> {
        self.resolvers
            .get(type_name)
            .and_then(|fields| fields.get(field_name))
    }

    fn run(&self, request: ExecutionRequest<'_, Value, C>) -> graphql::Response {
        let document = match ast::Document::parse(request.query, "query.graphql") {
            Ok(document) => document,
            Err(invalid) => {
                tracing::debug!("operation failed to parse");
                return graphql::Response::from_errors(
                    invalid
                        .errors
                        .iter()
                        .map(|diagnostic| diagnostic.to_json().into())
                        .collect(),
                );
            }
        };

        let operation = match select_operation(&document, request.operation_name) {
            Ok(operation) => operation,
            Err(error) => return graphql::Response::from_errors(vec![error]),
        };
        let root_type = match root_type(&self.schema, operation.operation_type) {
            Ok(root_type) => root_type,
            Err(error) => return graphql::Response::from_errors(vec![error]),
        };

        let fragments: HashMap<&str, &Node<ast::FragmentDefinition>> = document
            .definitions
            .iter()
            .filter_map(|definition| match definition {
                ast::Definition::FragmentDefinition(fragment) => {
                    Some((fragment.name.as_str(), fragment))
                }
                _ => None,
            })
            .collect();

        let mut validator = Validator {
            schema: &self.schema,
            sources: &document.sources,
            fragments: &fragments,
            defined_variables: operation
                .variables
                .iter()
                .map(|variable| variable.name.as_str())
                .collect(),
            spreading: Vec::new(),
            validated: HashSet::new(),
            errors: Vec::new(),
        };
        validator.selection_set(root_type, &operation.selection_set);
        let variables = match coerce_variables(operation, request.variables, &document.sources) {
            Ok(variables) => variables,
            Err(errors) => {
                validator.errors.extend(errors);
                Object::new()
            }
        };
        if !validator.errors.is_empty() {
            tracing::debug!(errors = validator.errors.len(), "operation is invalid");
            return graphql::Response::from_errors(validator.errors);
        }

        let mut execution = Execution {
            executor: self,
            sources: &document.sources,
            fragments: &fragments,
            variables: &variables,
            context: request.context,
            path: Vec::new(),
            errors: Vec::new(),
        };
        let data = execution
            .selection_set(
                root_type,
                request.root_value,
                &[operation.selection_set.as_slice()],
            )
            .map(Value::Object)
            .unwrap_or(Value::Null);

        graphql::Response::builder()
            .data(data)
            .errors(execution.errors)
            .build()
    }
}

impl<C> Clone for SchemaExecutor<C> {
    fn clone(&self) -> Self {
        Self {
            schema: self.schema.clone(),
            resolvers: self.resolvers.clone(),
        }
    }
}

impl<C> fmt::Debug for SchemaExecutor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut resolvers: Vec<String> = self
            .resolvers
            .iter()
            .flat_map(|(type_name, fields)| {
                fields
                    .keys()
                    .map(move |field_name| format!("{type_name}.{field_name}"))
            })
            .collect();
        resolvers.sort();
        f.debug_struct("SchemaExecutor")
            .field("resolvers", &resolvers)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl<C> Executor for SchemaExecutor<C>
where
    C: Send + Sync + 'static,
{
    type Root = Value;
    type Context = C;

    async fn execute(&self, request: ExecutionRequest<'_, Value, C>) -> graphql::Response {
        self.run(request)
    }
}

fn request_error(message: impl Into<String>) -> graphql::Error {
    graphql::Error::builder().message(message).build()
}

fn located_error<T>(message: String, node: &Node<T>, sources: &SourceMap) -> graphql::Error {
    let locations: Vec<Location> = node
        .line_column_range(sources)
        .map(|range| Location {
            line: range.start.line as u32,
            column: range.start.column as u32,
        })
        .into_iter()
        .collect();
    graphql::Error::builder()
        .message(message)
        .locations(locations)
        .build()
}

fn select_operation<'d>(
    document: &'d ast::Document,
    operation_name: Option<&str>,
) -> Result<&'d Node<ast::OperationDefinition>, graphql::Error> {
    let mut operations = document
        .definitions
        .iter()
        .filter_map(|definition| match definition {
            ast::Definition::OperationDefinition(operation) => Some(operation),
            _ => None,
        });
    match operation_name {
        Some(name) => operations
            .find(|operation| operation.name.as_ref().is_some_and(|n| n.as_str() == name))
            .ok_or_else(|| request_error(format!("Unknown operation named \"{name}\"."))),
        None => match (operations.next(), operations.next()) {
            (Some(operation), None) => Ok(operation),
            (Some(_), Some(_)) => Err(request_error(
                "Must provide operation name if query contains multiple operations.",
            )),
            (None, _) => Err(request_error("Must provide an operation.")),
        },
    }
}

fn root_type(schema: &Schema, operation_type: ast::OperationType) -> Result<&str, graphql::Error> {
    let kind = match operation_type {
        ast::OperationType::Query => "query",
        ast::OperationType::Mutation => "mutation",
        ast::OperationType::Subscription => {
            return Err(request_error("Subscriptions are not supported."));
        }
    };
    schema
        .root_operation(operation_type)
        .map(|name| name.as_str())
        .ok_or_else(|| request_error(format!("Schema is not configured for {kind} operations.")))
}

/// Apply declared defaults and check required variables.
fn coerce_variables(
    operation: &ast::OperationDefinition,
    provided: &Object,
    sources: &SourceMap,
) -> Result<Object, Vec<graphql::Error>> {
    let mut variables = Object::new();
    let mut errors = Vec::new();
    for definition in &operation.variables {
        let name = definition.name.as_str();
        let ty: &ast::Type = &definition.ty;
        match provided.get(name) {
            Some(Value::Null) if ty.is_non_null() => errors.push(located_error(
                format!("Variable \"${name}\" of non-null type \"{ty}\" must not be null."),
                definition,
                sources,
            )),
            Some(value) => {
                variables.insert(name.to_string(), coerce_input(ty, value.clone()));
            }
            None => match &definition.default_value {
                Some(default) => {
                    let value = input_value(default, &Object::new());
                    variables.insert(name.to_string(), coerce_input(ty, value));
                }
                None if ty.is_non_null() => errors.push(located_error(
                    format!("Variable \"${name}\" of required type \"{ty}\" was not provided."),
                    definition,
                    sources,
                )),
                None => {}
            },
        }
    }
    if errors.is_empty() {
        Ok(variables)
    } else {
        Err(errors)
    }
}

/// The value of an input literal, with variables substituted.
fn input_value(value: &ast::Value, variables: &Object) -> Value {
    match value {
        ast::Value::Null => Value::Null,
        ast::Value::Enum(name) => Value::String(name.to_string()),
        ast::Value::Variable(name) => variables.get(name.as_str()).cloned().unwrap_or_default(),
        ast::Value::String(string) => Value::from(string.as_str()),
        ast::Value::Float(float) => float
            .as_str()
            .parse::<f64>()
            .map(Value::Double)
            .unwrap_or_default(),
        ast::Value::Int(int) => int
            .as_str()
            .parse::<i64>()
            .map(Value::Int)
            .or_else(|_| int.as_str().parse::<f64>().map(Value::Double))
            .unwrap_or_default(),
        ast::Value::Boolean(boolean) => Value::Bool(*boolean),
        ast::Value::List(items) => Value::Array(
            items
                .iter()
                .map(|item| input_value(item, variables))
                .collect(),
        ),
        ast::Value::Object(fields) => fields
            .iter()
            .map(|(name, item)| (name.to_string(), input_value(item, variables)))
            .collect(),
    }
}

/// Input coercion for the few cases where the value kind changes.
fn coerce_input(ty: &ast::Type, value: Value) -> Value {
    match (ty, value) {
        (_, Value::Null) => Value::Null,
        (ast::Type::List(inner) | ast::Type::NonNullList(inner), Value::Array(items)) => {
            Value::Array(
                items
                    .into_iter()
                    .map(|item| coerce_input(inner, item))
                    .collect(),
            )
        }
        (ast::Type::List(inner) | ast::Type::NonNullList(inner), value) => {
            Value::Array(vec![coerce_input(inner, value)])
        }
        (ast::Type::Named(name) | ast::Type::NonNullNamed(name), Value::Int(int))
            if name.as_str() == "Float" =>
        {
            Value::Double(int as f64)
        }
        (_, value) => value,
    }
}

fn is_possible_type(schema: &Schema, abstract_type: &str, object_type: &str) -> bool {
    match schema.types.get(abstract_type) {
        Some(ExtendedType::Interface(_)) => schema
            .get_object(object_type)
            .is_some_and(|object| object.implements_interfaces.contains(abstract_type)),
        Some(ExtendedType::Union(union)) => union.members.contains(object_type),
        _ => false,
    }
}

struct Validator<'a> {
    schema: &'a Schema,
    sources: &'a SourceMap,
    fragments: &'a HashMap<&'a str, &'a Node<ast::FragmentDefinition>>,
    defined_variables: HashSet<&'a str>,
    spreading: Vec<&'a str>,
    validated: HashSet<&'a str>,
    errors: Vec<graphql::Error>,
}

impl<'a> Validator<'a> {
    fn error<T>(&mut self, message: String, node: &Node<T>) {
        self.errors.push(located_error(message, node, self.sources));
    }

    fn selection_set(&mut self, parent_type: &str, selections: &'a [ast::Selection]) {
        for selection in selections {
            match selection {
                ast::Selection::Field(field) => self.field(parent_type, field),
                ast::Selection::FragmentSpread(spread) => self.fragment_spread(spread),
                ast::Selection::InlineFragment(inline) => {
                    self.directives(&inline.directives);
                    let type_condition = match &inline.type_condition {
                        Some(name) if !self.schema.types.contains_key(name.as_str()) => {
                            self.error(format!("Unknown type \"{name}\"."), inline);
                            continue;
                        }
                        Some(name) => name.as_str(),
                        None => parent_type,
                    };
                    self.selection_set(type_condition, &inline.selection_set);
                }
            }
        }
    }

    fn field(&mut self, parent_type: &str, field: &'a Node<ast::Field>) {
        self.directives(&field.directives);
        for argument in &field.arguments {
            self.value(&argument.value);
        }

        if field.name.as_str() == TYPENAME {
            if !field.selection_set.is_empty() {
                self.error(
                    format!(
                        "Field \"{TYPENAME}\" must not have a selection since type \"String!\" has no subfields."
                    ),
                    field,
                );
            }
            return;
        }

        let schema = self.schema;
        let Ok(definition) = schema.type_field(parent_type, field.name.as_str()) else {
            self.error(
                format!(
                    "Cannot query field \"{}\" on type \"{parent_type}\".",
                    field.name
                ),
                field,
            );
            return;
        };

        for argument in &field.arguments {
            if !definition
                .arguments
                .iter()
                .any(|defined| defined.name == argument.name)
            {
                self.error(
                    format!(
                        "Unknown argument \"{}\" on field \"{parent_type}.{}\".",
                        argument.name, field.name
                    ),
                    argument,
                );
            }
        }
        for defined in &definition.arguments {
            let ty: &ast::Type = &defined.ty;
            if ty.is_non_null()
                && defined.default_value.is_none()
                && !field
                    .arguments
                    .iter()
                    .any(|argument| argument.name == defined.name)
            {
                self.error(
                    format!(
                        "Field \"{}\" argument \"{}\" of type \"{ty}\" is required, but it was not provided.",
                        field.name, defined.name
                    ),
                    field,
                );
            }
        }

        let type_name = definition.ty.inner_named_type().as_str();
        match schema.types.get(type_name) {
            Some(ExtendedType::Scalar(_) | ExtendedType::Enum(_)) => {
                if !field.selection_set.is_empty() {
                    self.error(
                        format!(
                            "Field \"{}\" must not have a selection since type \"{}\" has no subfields.",
                            field.name, definition.ty
                        ),
                        field,
                    );
                }
            }
            Some(_) => {
                if field.selection_set.is_empty() {
                    self.error(
                        format!(
                            "Field \"{name}\" of type \"{}\" must have a selection of subfields. Did you mean \"{name} {{ ... }}\"?",
                            definition.ty,
                            name = field.name,
                        ),
                        field,
                    );
                } else {
                    self.selection_set(type_name, &field.selection_set);
                }
            }
            None => {}
        }
    }

    fn fragment_spread(&mut self, spread: &'a Node<ast::FragmentSpread>) {
        self.directives(&spread.directives);
        let name = spread.fragment_name.as_str();
        let fragments = self.fragments;
        let Some(fragment) = fragments.get(name).copied() else {
            self.error(format!("Unknown fragment \"{name}\"."), spread);
            return;
        };
        if self.spreading.contains(&name) {
            self.error(format!("Cannot spread fragment \"{name}\" within itself."), spread);
            return;
        }
        if !self.validated.insert(name) {
            return;
        }
        let type_condition = fragment.type_condition.as_str();
        if !self.schema.types.contains_key(type_condition) {
            self.error(format!("Unknown type \"{type_condition}\"."), fragment);
            return;
        }
        self.spreading.push(name);
        self.selection_set(type_condition, &fragment.selection_set);
        self.spreading.pop();
    }

    fn directives(&mut self, directives: &'a ast::DirectiveList) {
        for directive in directives.iter() {
            for argument in &directive.arguments {
                self.value(&argument.value);
            }
        }
    }

    fn value(&mut self, value: &'a Node<ast::Value>) {
        match &**value {
            ast::Value::Variable(name) => {
                if !self.defined_variables.contains(name.as_str()) {
                    self.error(format!("Variable \"${name}\" is not defined."), value);
                }
            }
            ast::Value::List(items) => {
                for item in items {
                    self.value(item);
                }
            }
            ast::Value::Object(fields) => {
                for (_, item) in fields {
                    self.value(item);
                }
            }
            _ => {}
        }
    }
}

/// A field error was raised where null is not allowed: the nearest nullable
/// parent becomes null.
struct PropagateNull;

/// Turn a propagated null into a null value when `ty` allows it.
fn nullify(ty: &ast::Type, result: Result<Value, PropagateNull>) -> Result<Value, PropagateNull> {
    match result {
        Err(PropagateNull) if !ty.is_non_null() => Ok(Value::Null),
        result => result,
    }
}

struct FieldSite<'s> {
    parent_type: &'s str,
    field: &'s Node<ast::Field>,
}

struct Execution<'a, C> {
    executor: &'a SchemaExecutor<C>,
    sources: &'a SourceMap,
    fragments: &'a HashMap<&'a str, &'a Node<ast::FragmentDefinition>>,
    variables: &'a Object,
    context: Option<&'a C>,
    path: Vec<PathElement>,
    errors: Vec<graphql::Error>,
}

impl<'a, C> Execution<'a, C> {
    fn field_error(&mut self, message: String, field: &Node<ast::Field>) {
        let mut error = located_error(message, field, self.sources);
        error.path = Some(Path(self.path.clone()));
        self.errors.push(error);
    }

    fn selection_set(
        &mut self,
        object_type: &str,
        parent: &Value,
        selection_sets: &[&'a [ast::Selection]],
    ) -> Result<Object, PropagateNull> {
        let mut grouped: IndexMap<&'a str, Vec<&'a Node<ast::Field>>> = IndexMap::new();
        let mut visited = HashSet::new();
        for selections in selection_sets {
            self.collect_fields(object_type, selections, &mut grouped, &mut visited);
        }

        let mut object = Object::new();
        for (response_key, fields) in grouped {
            self.path.push(PathElement::Key(response_key.to_string()));
            let result = self.field(object_type, parent, &fields);
            self.path.pop();
            object.insert(response_key.to_string(), result?);
        }
        Ok(object)
    }

    fn collect_fields(
        &self,
        object_type: &str,
        selections: &'a [ast::Selection],
        grouped: &mut IndexMap<&'a str, Vec<&'a Node<ast::Field>>>,
        visited: &mut HashSet<&'a str>,
    ) {
        for selection in selections {
            match selection {
                ast::Selection::Field(field) => {
                    if self.included(&field.directives) {
                        let key = field.alias.as_ref().unwrap_or(&field.name).as_str();
                        grouped.entry(key).or_default().push(field);
                    }
                }
                ast::Selection::FragmentSpread(spread) => {
                    let name = spread.fragment_name.as_str();
                    if !self.included(&spread.directives) || !visited.insert(name) {
                        continue;
                    }
                    let fragments = self.fragments;
                    let Some(fragment) = fragments.get(name).copied() else {
                        continue;
                    };
                    if self.applies(fragment.type_condition.as_str(), object_type) {
                        self.collect_fields(object_type, &fragment.selection_set, grouped, visited);
                    }
                }
                ast::Selection::InlineFragment(inline) => {
                    let applies = inline
                        .type_condition
                        .as_ref()
                        .is_none_or(|condition| self.applies(condition.as_str(), object_type));
                    if self.included(&inline.directives) && applies {
                        self.collect_fields(object_type, &inline.selection_set, grouped, visited);
                    }
                }
            }
        }
    }

    /// `@skip(if:)` and `@include(if:)`.
    fn included(&self, directives: &ast::DirectiveList) -> bool {
        let condition = |name: &str| {
            directives
                .get(name)
                .and_then(|directive| {
                    directive
                        .arguments
                        .iter()
                        .find(|argument| argument.name.as_str() == "if")
                })
                .map(|argument| input_value(&argument.value, self.variables))
        };
        !matches!(condition("skip"), Some(Value::Bool(true)))
            && !matches!(condition("include"), Some(Value::Bool(false)))
    }

    fn applies(&self, type_condition: &str, object_type: &str) -> bool {
        type_condition == object_type
            || is_possible_type(&self.executor.schema, type_condition, object_type)
    }

    fn field(
        &mut self,
        parent_type: &str,
        parent: &Value,
        fields: &[&'a Node<ast::Field>],
    ) -> Result<Value, PropagateNull> {
        let field = fields[0];
        let name = field.name.as_str();
        if name == TYPENAME {
            return Ok(Value::String(parent_type.to_string()));
        }

        let executor = self.executor;
        let Ok(definition) = executor.schema.type_field(parent_type, name) else {
            self.field_error(
                format!("Cannot query field \"{name}\" on type \"{parent_type}\"."),
                field,
            );
            return Ok(Value::Null);
        };

        let arguments = self.arguments(&definition.arguments, &field.arguments);
        let resolved = match executor.field_resolver(parent_type, name) {
            Some(resolver) => (**resolver)(ResolveInfo {
                parent,
                arguments: &arguments,
                context: self.context,
                type_name: parent_type,
                field_name: name,
            }),
            None => Ok(parent.get(name).cloned().unwrap_or_default()),
        };

        let completed = match resolved {
            Ok(value) => {
                let site = FieldSite { parent_type, field };
                self.complete_value(&site, &definition.ty, value, fields)
            }
            Err(error) => {
                self.field_error(error.to_string(), field);
                Err(PropagateNull)
            }
        };
        nullify(&definition.ty, completed)
    }

    fn arguments(
        &self,
        definitions: &[Node<ast::InputValueDefinition>],
        arguments: &[Node<ast::Argument>],
    ) -> Object {
        let mut coerced = Object::new();
        for definition in definitions {
            let provided = arguments
                .iter()
                .find(|argument| argument.name == definition.name)
                .map(|argument| &*argument.value);
            let default = || {
                definition
                    .default_value
                    .as_ref()
                    .map(|default| input_value(default, self.variables))
            };
            let value = match provided {
                Some(ast::Value::Variable(variable)) => match self.variables.get(variable.as_str()) {
                    Some(value) => Some(value.clone()),
                    None => default(),
                },
                Some(value) => Some(input_value(value, self.variables)),
                None => default(),
            };
            if let Some(value) = value {
                coerced.insert(
                    definition.name.to_string(),
                    coerce_input(&definition.ty, value),
                );
            }
        }
        coerced
    }

    fn complete_value(
        &mut self,
        site: &FieldSite<'_>,
        ty: &ast::Type,
        value: Value,
        fields: &[&'a Node<ast::Field>],
    ) -> Result<Value, PropagateNull> {
        if value.is_null() {
            if ty.is_non_null() {
                self.field_error(
                    format!(
                        "Cannot return null for non-nullable field {}.{}.",
                        site.parent_type, site.field.name
                    ),
                    site.field,
                );
                return Err(PropagateNull);
            }
            return Ok(Value::Null);
        }

        match ty {
            ast::Type::List(inner) | ast::Type::NonNullList(inner) => {
                let Value::Array(items) = value else {
                    self.field_error(
                        format!(
                            "Expected Iterable, but did not find one for field \"{}.{}\".",
                            site.parent_type, site.field.name
                        ),
                        site.field,
                    );
                    return Err(PropagateNull);
                };
                let mut completed = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    self.path.push(PathElement::Index(index));
                    let result = self.complete_value(site, inner, item, fields);
                    self.path.pop();
                    completed.push(nullify(inner, result)?);
                }
                Ok(Value::Array(completed))
            }
            ast::Type::Named(name) | ast::Type::NonNullNamed(name) => {
                self.complete_named(site, name.as_str(), value, fields)
            }
        }
    }

    fn complete_named(
        &mut self,
        site: &FieldSite<'_>,
        type_name: &str,
        value: Value,
        fields: &[&'a Node<ast::Field>],
    ) -> Result<Value, PropagateNull> {
        let executor = self.executor;
        let schema: &Schema = &executor.schema;
        match schema.types.get(type_name) {
            Some(ExtendedType::Scalar(_)) => match coerce_leaf(type_name, value) {
                Some(value) => Ok(value),
                None => {
                    self.field_error(
                        format!(
                            "{type_name} cannot represent the value returned for field \"{}.{}\".",
                            site.parent_type, site.field.name
                        ),
                        site.field,
                    );
                    Err(PropagateNull)
                }
            },
            Some(ExtendedType::Enum(definition)) => {
                if value
                    .as_str()
                    .is_some_and(|name| definition.values.contains_key(name))
                {
                    Ok(value)
                } else {
                    self.field_error(
                        format!(
                            "Enum \"{type_name}\" cannot represent the value returned for field \"{}.{}\".",
                            site.parent_type, site.field.name
                        ),
                        site.field,
                    );
                    Err(PropagateNull)
                }
            }
            Some(ExtendedType::Object(_)) => self.sub_selection(type_name, &value, fields),
            Some(ExtendedType::Interface(_) | ExtendedType::Union(_)) => {
                let concrete = value
                    .get(TYPENAME)
                    .and_then(Value::as_str)
                    .filter(|concrete| is_possible_type(schema, type_name, concrete));
                match concrete {
                    Some(concrete) => self.sub_selection(concrete, &value, fields),
                    None => {
                        self.field_error(
                            format!(
                                "Abstract type \"{type_name}\" must resolve to an Object type at runtime for field \"{}.{}\".",
                                site.parent_type, site.field.name
                            ),
                            site.field,
                        );
                        Err(PropagateNull)
                    }
                }
            }
            Some(ExtendedType::InputObject(_)) | None => {
                self.field_error(
                    format!("Type \"{type_name}\" cannot be used as an output type."),
                    site.field,
                );
                Err(PropagateNull)
            }
        }
    }

    fn sub_selection(
        &mut self,
        object_type: &str,
        value: &Value,
        fields: &[&'a Node<ast::Field>],
    ) -> Result<Value, PropagateNull> {
        let selection_sets: Vec<&'a [ast::Selection]> = fields
            .iter()
            .map(|field| field.selection_set.as_slice())
            .collect();
        self.selection_set(object_type, value, &selection_sets)
            .map(Value::Object)
    }
}

/// Result coercion of built-in scalars. Custom scalars pass through.
fn coerce_leaf(type_name: &str, value: Value) -> Option<Value> {
    match (type_name, value) {
        ("Int", Value::Int(int)) if i32::try_from(int).is_ok() => Some(Value::Int(int)),
        ("Int", Value::Double(double))
            if double.fract() == 0.0
                && double >= f64::from(i32::MIN)
                && double <= f64::from(i32::MAX) =>
        {
            Some(Value::Int(double as i64))
        }
        ("Int", _) => None,
        ("Float", Value::Int(int)) => Some(Value::Double(int as f64)),
        ("Float", Value::Double(double)) if double.is_finite() => Some(Value::Double(double)),
        ("Float", _) => None,
        ("String", Value::String(string)) => Some(Value::String(string)),
        ("String", Value::Bool(boolean)) => Some(Value::String(boolean.to_string())),
        ("String", Value::Int(int)) => Some(Value::String(int.to_string())),
        ("String", _) => None,
        ("Boolean", Value::Bool(boolean)) => Some(Value::Bool(boolean)),
        ("Boolean", _) => None,
        ("ID", Value::String(id)) => Some(Value::String(id)),
        ("ID", Value::Int(id)) => Some(Value::String(id.to_string())),
        ("ID", _) => None,
        (_, value) => Some(value),
    }
}
