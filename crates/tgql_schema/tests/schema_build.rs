//! End-to-end schema builds.

use indexmap::IndexMap;
use serde_json::json;
use tgql_core::BuildError;
use tgql_metadata::{
    ArgDeclaration, ArrayNullable, ClassDeclaration, Declarations, DirectiveUsage, EntityId,
    FieldDeclaration, HandlerDeclaration, NamedArg, ResolverDeclaration, TypeOptions,
    TypeReference, TypeRegistry,
};
use tgql_schema::{
    print_schema, ApolloFederation, BuildSchemaOptions, DateScalarMode, NamedType, PrintOptions,
    Schema, SchemaBuilder, TypeKind,
};

fn id_field() -> FieldDeclaration {
    FieldDeclaration::new("id", TypeReference::scalar("ID"))
}

fn build(registry: &TypeRegistry) -> Schema {
    SchemaBuilder::new().build(registry).unwrap()
}

struct Recipes {
    decls: Declarations,
    recipe: EntityId,
    resolver: EntityId,
}

/// A resolver class plus a self-referencing `Recipe` object type.
fn recipes() -> Recipes {
    let mut decls = Declarations::new();
    let resolver = decls.entity("RecipeResolver");
    let recipe = decls.entity("Recipe");
    let author = decls.entity("Author");
    decls.object_type(
        ClassDeclaration::new(recipe)
            .field(id_field())
            .field(FieldDeclaration::new("author", TypeReference::declared(author)))
            .field(FieldDeclaration::new("reviewer", TypeReference::declared(author)).nullable())
            .field(FieldDeclaration::new(
                "related",
                TypeReference::thunk(move || TypeReference::list(TypeReference::declared(recipe))),
            )),
    );
    decls.object_type(
        ClassDeclaration::new(author)
            .field(FieldDeclaration::new("name", TypeReference::scalar("String"))),
    );
    Recipes {
        decls,
        recipe,
        resolver,
    }
}

#[test]
fn test_query_and_mutation_without_subscription() {
    let Recipes {
        mut decls,
        recipe,
        resolver,
    } = recipes();
    decls.query(HandlerDeclaration::new(resolver, "recipeCount", TypeReference::scalar("Int")));
    decls.mutation(
        HandlerDeclaration::new(resolver, "addRecipe", TypeReference::declared(recipe))
            .arg(ArgDeclaration::arg("title", TypeReference::scalar("String"))),
    );
    let registry = decls.finish().unwrap();
    let schema = build(&registry);

    let query = schema.query_type().unwrap();
    assert_eq!(query.field_count(), 1);
    assert_eq!(schema.display_type(&query.field("recipeCount").unwrap().ty), "Int!");

    let mutation = schema.mutation_type().unwrap();
    assert_eq!(mutation.field_count(), 1);
    let add = mutation.field("addRecipe").unwrap();
    assert_eq!(schema.display_type(&add.ty), "Recipe!");
    assert_eq!(add.resolver.as_ref().unwrap().target, resolver);
    assert_eq!(add.resolver.as_ref().unwrap().method_name, "addRecipe");

    assert!(schema.subscription_type().is_none());
    assert!(schema.get_type("Subscription").is_none());
}

#[test]
fn test_structural_sharing_and_self_reference() {
    let Recipes {
        mut decls,
        recipe,
        resolver,
    } = recipes();
    decls.query(HandlerDeclaration::new(resolver, "recipe", TypeReference::declared(recipe)));
    let registry = decls.finish().unwrap();
    let schema = build(&registry);

    let recipe_id = schema.type_id("Recipe").unwrap();
    let recipe = schema.get(recipe_id).and_then(NamedType::as_object).unwrap();
    assert!(recipe.is_wired());

    let author = recipe.field("author").unwrap();
    let reviewer = recipe.field("reviewer").unwrap();
    assert_eq!(author.ty.named(), reviewer.ty.named());
    assert_eq!(schema.display_type(&reviewer.ty), "Author");

    let related = recipe.field("related").unwrap();
    assert_eq!(related.ty.named(), recipe_id);
    assert_eq!(schema.display_type(&related.ty), "[Recipe!]!");
    assert_eq!(
        schema.query_type().unwrap().field("recipe").unwrap().ty.named(),
        recipe_id
    );
    assert_eq!(schema.types().filter(|(_, t)| t.name() == "Recipe").count(), 1);
}

#[test]
fn test_nested_list_wrapping() {
    let mut decls = Declarations::new();
    let resolver = decls.entity("RecipeResolver");
    decls.query(
        HandlerDeclaration::new(resolver, "grid", TypeReference::scalar("Int")).options(
            TypeOptions::new()
                .list(2)
                .with_array_nullable(ArrayNullable::PerDepth(vec![true, false])),
        ),
    );
    decls.query(HandlerDeclaration::new(
        resolver,
        "matrix",
        TypeReference::list(TypeReference::list(TypeReference::scalar("Float"))),
    ));
    let registry = decls.finish().unwrap();
    let schema = build(&registry);

    let query = schema.query_type().unwrap();
    assert_eq!(schema.display_type(&query.field("grid").unwrap().ty), "[[Int!]]!");
    assert_eq!(schema.display_type(&query.field("matrix").unwrap().ty), "[[Float!]!]!");
}

#[test]
fn test_argument_bundle_override() {
    let mut decls = Declarations::new();
    let resolver = decls.entity("RecipeResolver");
    let base = decls.entity("PaginationArgs");
    let args = decls.entity_extending("RecipesArgs", base);
    decls.set_defaults(base, || IndexMap::from([("take".to_string(), json!(1))]));
    decls.set_defaults(args, || IndexMap::from([("take".to_string(), json!(2))]));
    decls.args_type(
        ClassDeclaration::new(base).field(FieldDeclaration::new("take", TypeReference::scalar("Int"))),
    );
    decls.args_type(
        ClassDeclaration::new(args).field(FieldDeclaration::new("take", TypeReference::scalar("Int"))),
    );
    decls.query(
        HandlerDeclaration::new(resolver, "recipes", TypeReference::scalar("String"))
            .arg(NamedArg::new("locale", TypeReference::scalar("String")).nullable())
            .arg(ArgDeclaration::args(TypeReference::declared(args))),
    );
    let registry = decls.finish().unwrap();
    let schema = build(&registry);

    let field = schema.query_type().unwrap().field("recipes").unwrap();
    let names: Vec<_> = field.args.keys().map(String::as_str).collect();
    assert_eq!(names, ["locale", "take"]);
    assert_eq!(field.args["take"].default_value, Some(json!(2)));
}

#[test]
fn test_reregistration_is_idempotent() {
    let mut decls = Declarations::new();
    let resolver = decls.entity("RecipeResolver");
    let recipe = decls.entity("Recipe");
    for _ in 0..2 {
        decls.object_type(ClassDeclaration::new(recipe).field(id_field()));
    }
    decls.query(HandlerDeclaration::new(resolver, "recipe", TypeReference::declared(recipe)));
    let registry = decls.finish().unwrap();
    assert_eq!(registry.object_types_metadata().len(), 1);

    let schema = build(&registry);
    assert_eq!(schema.get_type("Recipe").and_then(NamedType::as_object).unwrap().field_count(), 1);
}

#[test]
fn test_interface_implementers_are_orphans() {
    let mut decls = Declarations::new();
    let resolver = decls.entity("NodeResolver");
    let node = decls.entity("Node");
    let recipe = decls.entity("Recipe");
    decls.interface_type(ClassDeclaration::new(node).field(id_field()));
    decls.object_type(
        ClassDeclaration::new(recipe)
            .implements(TypeReference::declared(node))
            .field(FieldDeclaration::new("title", TypeReference::scalar("String"))),
    );
    decls.query(HandlerDeclaration::new(resolver, "node", TypeReference::declared(node)));
    let registry = decls.finish().unwrap();
    let schema = build(&registry);

    let node_id = schema.type_id("Node").unwrap();
    assert_eq!(schema.get(node_id).unwrap().kind(), TypeKind::Interface);
    let recipe = schema.get_type("Recipe").and_then(NamedType::as_object).unwrap();
    assert_eq!(recipe.interfaces, [node_id]);
    let fields: Vec<_> = recipe.fields().map(|f| f.name.as_str()).collect();
    assert_eq!(fields, ["id", "title"]);
}

#[test]
fn test_federation_key_makes_interface_an_orphan() {
    let mut decls = Declarations::new();
    let resolver = decls.entity("RecipeResolver");
    let product = decls.entity("Product");
    decls.interface_type(
        ClassDeclaration::new(product)
            .directive(DirectiveUsage::new("key").with_argument("fields", json!("upc")))
            .field(FieldDeclaration::new("upc", TypeReference::scalar("String"))),
    );
    decls.query(HandlerDeclaration::new(resolver, "ping", TypeReference::scalar("Boolean")));
    let registry = decls.finish().unwrap();

    let plain = build(&registry);
    assert!(plain.get_type("Product").is_none());

    let federated = SchemaBuilder::new()
        .build_federated(&registry, &ApolloFederation)
        .unwrap();
    let product = federated.get_type("Product").and_then(NamedType::as_interface).unwrap();
    assert_eq!(product.ast_node.as_ref().unwrap().directives[0].name, "key");
    assert!(!federated.directive("key").unwrap().repeatable);
    assert!(federated.directive("deprecated").is_some());

    let sdl = print_schema(&federated, &PrintOptions::default());
    assert!(sdl.contains("interface Product @key(fields: \"upc\") {"));
    assert!(sdl.contains("directive @key(fields: _FieldSet!) on OBJECT | INTERFACE"));
}

#[test]
fn test_federated_schema_defines_field_set() {
    let mut decls = Declarations::new();
    let resolver = decls.entity("RecipeResolver");
    decls.query(HandlerDeclaration::new(resolver, "ping", TypeReference::scalar("Boolean")));
    let registry = decls.finish().unwrap();

    let plain = build(&registry);
    assert!(plain.get_type("_FieldSet").is_none());

    let federated = SchemaBuilder::new()
        .build_federated(&registry, &ApolloFederation)
        .unwrap();
    assert_eq!(federated.get_type("_FieldSet").map(NamedType::kind), Some(TypeKind::Scalar));

    let sdl = print_schema(&federated, &PrintOptions::default());
    assert!(sdl.contains("directive @requires(fields: _FieldSet!) on FIELD_DEFINITION"));
    assert!(sdl.contains("scalar _FieldSet"));
}

/// Declares the same schema with its entities and declarations taken in
/// `order`.
fn declare_in_order(order: [usize; 4]) -> TypeRegistry {
    let mut decls = Declarations::new();
    let names = ["Node", "Recipe", "Author", "RecipeInput"];
    let mut ids = IndexMap::new();
    for &i in &order {
        ids.insert(i, decls.entity(names[i]));
    }
    let (node, recipe, author, input) = (ids[&0], ids[&1], ids[&2], ids[&3]);
    let resolver = decls.entity("RecipeResolver");

    for &i in &order {
        match i {
            0 => decls.interface_type(ClassDeclaration::new(node).field(id_field())),
            1 => decls.object_type(
                ClassDeclaration::new(recipe)
                    .implements(TypeReference::declared(node))
                    .field(id_field())
                    .field(FieldDeclaration::new("author", TypeReference::declared(author))),
            ),
            2 => decls.object_type(
                ClassDeclaration::new(author)
                    .field(FieldDeclaration::new("name", TypeReference::scalar("String"))),
            ),
            _ => decls.input_type(
                ClassDeclaration::new(input)
                    .field(FieldDeclaration::new("title", TypeReference::scalar("String"))),
            ),
        }
    }
    let handlers = [
        HandlerDeclaration::new(resolver, "recipes", TypeReference::list(TypeReference::declared(recipe))),
        HandlerDeclaration::new(resolver, "author", TypeReference::declared(author)),
    ];
    let [first, second] = handlers;
    if order[0] < order[3] {
        decls.query(first);
        decls.query(second);
    } else {
        decls.query(second);
        decls.query(first);
    }
    decls.mutation(
        HandlerDeclaration::new(resolver, "addRecipe", TypeReference::declared(recipe))
            .arg(ArgDeclaration::arg("input", TypeReference::declared(input))),
    );
    decls.finish().unwrap()
}

#[test]
fn test_sorted_output_ignores_registration_order() {
    let options = PrintOptions {
        sort_types: true,
        ..PrintOptions::default()
    };
    let forward = print_schema(&build(&declare_in_order([0, 1, 2, 3])), &options);
    let reversed = print_schema(&build(&declare_in_order([3, 2, 1, 0])), &options);

    assert_eq!(forward, reversed);
    assert!(forward.contains("type Recipe implements Node {"));
    assert!(forward.contains("addRecipe(input: RecipeInput!): Recipe!"));
}

#[test]
fn test_explicit_orphaned_types() {
    let mut decls = Declarations::new();
    let resolver = decls.entity("RecipeResolver");
    let audit = decls.entity("AuditEntry");
    decls.object_type(ClassDeclaration::new(audit).field(id_field()));
    decls.query(HandlerDeclaration::new(resolver, "ping", TypeReference::scalar("Boolean")));
    let registry = decls.finish().unwrap();

    assert!(build(&registry).get_type("AuditEntry").is_none());
    let schema = SchemaBuilder::new()
        .with_orphaned_types([audit])
        .build(&registry)
        .unwrap();
    assert!(schema.get_type("AuditEntry").is_some());
}

#[test]
fn test_field_resolvers_and_abstract_inheritance() {
    let Recipes {
        mut decls,
        recipe,
        resolver,
    } = recipes();
    let base = decls.entity("ResourceResolver");
    let concrete = decls.entity_extending("RecipeResourceResolver", base);
    decls.resolver(ResolverDeclaration::new(resolver).of_type(TypeReference::declared(recipe)));
    decls.resolver(ResolverDeclaration::new(base).abstract_resolver());
    decls.resolver(ResolverDeclaration::new(concrete));
    decls.resolve_field(
        HandlerDeclaration::new(resolver, "ratingCount", TypeReference::scalar("Int"))
            .arg(NamedArg::new("minimum", TypeReference::scalar("Int")).default_value(json!(0)))
            .complexity(5),
    );
    decls.query(HandlerDeclaration::new(base, "recipes", TypeReference::list(TypeReference::declared(recipe))));
    let registry = decls.finish().unwrap();
    let schema = build(&registry);

    let query = schema.query_type().unwrap();
    let recipes = query.field("recipes").unwrap();
    assert_eq!(recipes.resolver.as_ref().unwrap().target, concrete);

    let recipe = schema.get_type("Recipe").and_then(NamedType::as_object).unwrap();
    let rating = recipe.field("ratingCount").unwrap();
    assert_eq!(rating.args["minimum"].default_value, Some(json!(0)));
    assert_eq!(rating.extensions.get("complexity"), Some(&json!(5)));
    assert_eq!(rating.resolver.as_ref().unwrap().target, resolver);
}

#[test]
fn test_resolver_filter_drops_roots() {
    let Recipes {
        mut decls,
        recipe,
        resolver,
    } = recipes();
    let admin = decls.entity("AdminResolver");
    decls.query(HandlerDeclaration::new(resolver, "recipe", TypeReference::declared(recipe)));
    decls.mutation(HandlerDeclaration::new(admin, "purge", TypeReference::scalar("Boolean")));
    let registry = decls.finish().unwrap();

    let schema = SchemaBuilder::new()
        .with_resolvers([resolver])
        .build(&registry)
        .unwrap();
    assert!(schema.query_type().is_some());
    assert!(schema.mutation_type().is_none());
}

#[test]
fn test_instance_default_wins() {
    let mut decls = Declarations::new();
    let resolver = decls.entity("RecipeResolver");
    let input = decls.entity("RecipeInput");
    decls.set_defaults(input, || IndexMap::from([("servings".to_string(), json!(4))]));
    decls.input_type(
        ClassDeclaration::new(input).field(
            FieldDeclaration::new("servings", TypeReference::scalar("Int")).default_value(json!(2)),
        ),
    );
    decls.mutation(
        HandlerDeclaration::new(resolver, "addRecipe", TypeReference::scalar("Boolean"))
            .arg(ArgDeclaration::arg("input", TypeReference::declared(input))),
    );
    let registry = decls.finish().unwrap();
    let schema = build(&registry);

    let input = schema.get_type("RecipeInput").and_then(NamedType::as_input_object).unwrap();
    assert_eq!(input.field("servings").unwrap().default_value, Some(json!(4)));
}

#[test]
fn test_output_type_in_input_position() {
    let Recipes {
        mut decls,
        recipe,
        resolver,
    } = recipes();
    decls.mutation(
        HandlerDeclaration::new(resolver, "addRecipe", TypeReference::scalar("Boolean"))
            .arg(ArgDeclaration::arg("recipe", TypeReference::declared(recipe))),
    );
    let registry = decls.finish().unwrap();

    match SchemaBuilder::new().build(&registry).unwrap_err() {
        BuildError::CannotDetermineInputType { location } => {
            assert_eq!(location.to_string(), "RecipeResolver.addRecipe#0");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_undeclared_return_type() {
    let mut decls = Declarations::new();
    let resolver = decls.entity("RecipeResolver");
    let ghost = decls.entity("Ghost");
    decls.query(HandlerDeclaration::new(resolver, "ghost", TypeReference::declared(ghost)));
    decls.query(HandlerDeclaration::new(resolver, "money", TypeReference::scalar("Money")));
    let registry = decls.finish().unwrap();

    match SchemaBuilder::new().build(&registry).unwrap_err() {
        BuildError::UndeterminedType { location } => {
            assert_eq!(location.to_string(), "RecipeResolver.ghost");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_declared_type_named_like_a_root() {
    let mut decls = Declarations::new();
    let resolver = decls.entity("RecipeResolver");
    let query = decls.entity("Query");
    decls.object_type(ClassDeclaration::new(query).field(id_field()));
    decls.query(HandlerDeclaration::new(resolver, "query", TypeReference::declared(query)));
    let registry = decls.finish().unwrap();

    assert!(matches!(
        SchemaBuilder::new().build(&registry),
        Err(BuildError::NamingConflict { ref name, .. }) if name == "Query"
    ));
}

#[test]
fn test_validation() {
    let mut decls = Declarations::new();
    let resolver = decls.entity("RecipeResolver");
    let empty = decls.entity("Empty");
    let tagged = decls.entity("Tagged");
    decls.object_type(ClassDeclaration::new(empty));
    decls.object_type(
        ClassDeclaration::new(tagged).field(id_field().directive(DirectiveUsage::new("cached"))),
    );
    decls.query(HandlerDeclaration::new(resolver, "empty", TypeReference::declared(empty)));
    decls.query(HandlerDeclaration::new(resolver, "tagged", TypeReference::declared(tagged)));
    let registry = decls.finish().unwrap();

    match SchemaBuilder::new().build(&registry).unwrap_err() {
        BuildError::InvalidSchema { count, diagnostics } => {
            assert_eq!(count, 2);
            let codes: Vec<_> = diagnostics.iter().map(|d| d.code).collect();
            assert_eq!(codes, ["E0020", "E0030"]);
        }
        other => panic!("unexpected error: {other}"),
    }

    let options = BuildSchemaOptions::new().with_skip_check(true);
    assert!(SchemaBuilder::new().with_options(options).build(&registry).is_ok());
}

#[test]
fn test_date_scalar_modes() {
    let mut decls = Declarations::new();
    let resolver = decls.entity("RecipeResolver");
    decls.query(HandlerDeclaration::new(resolver, "now", TypeReference::scalar("Date")));
    let registry = decls.finish().unwrap();

    let iso = build(&registry);
    assert_eq!(iso.display_type(&iso.query_type().unwrap().field("now").unwrap().ty), "DateTime!");

    let options = BuildSchemaOptions::new().with_date_scalar_mode(DateScalarMode::Timestamp);
    let timestamp = SchemaBuilder::new().with_options(options).build(&registry).unwrap();
    assert!(timestamp.get_type("Timestamp").is_some());
    assert!(timestamp.get_type("DateTime").is_none());
}
