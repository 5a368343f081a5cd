//! API endpoint extractor
//!
//! Recognizes tRPC procedures inside `createTRPCRouter({ ... })` objects,
//! Express-style `router.get("/path", ...)` handlers and Next.js route
//! handlers (`export async function POST(...)`).

use super::helpers::{content_hash, file_node, file_node_id, line_at};
use super::{ExtractionError, Extractor, GraphFragment, SourceFile};
use crate::identity::{IdExtra, IdGenerator};
use crate::neo4j::models::*;
use regex::Regex;
use std::sync::LazyLock;

const API_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs"];
const API_PATH_KEYWORDS: &[&str] = &["router", "api", "trpc", "routes", "route."];

static ROUTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:export\s+)?const\s+(\w+)\s*=\s*(?:createTRPCRouter|t\.router|router)\s*\(\s*\{")
        .expect("valid regex")
});

static PROCEDURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(\w+)\s*:\s*(\w*[pP]rocedure)\b").expect("valid regex")
});

static PROCEDURE_KIND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.\s*(query|mutation|subscription)\s*\(").expect("valid regex")
});

static PROCEDURE_INPUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.\s*input\s*\(\s*([A-Za-z_][\w.]*)").expect("valid regex")
});

static EXPRESS_ROUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?:router|app|server)\s*\.\s*(get|post|put|patch|delete)\s*\(\s*["'`]([^"'`]+)["'`]"#)
        .expect("valid regex")
});

static NEXT_HANDLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*export\s+(?:async\s+)?function\s+(GET|POST|PUT|PATCH|DELETE)\s*\(")
        .expect("valid regex")
});

/// One recognized endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointDef {
    pub name: String,
    pub method: String,
    pub router: Option<String>,
    pub route: Option<String>,
    pub input_schema: Option<String>,
    pub line: u32,
}

/// Scan output for one API file
#[derive(Debug, Clone)]
pub struct ApiFileRecord {
    pub file: SourceFile,
    pub hash: String,
    pub line_count: u32,
    pub endpoints: Vec<EndpointDef>,
}

pub struct ApiExtractor {
    ids: IdGenerator,
}

impl ApiExtractor {
    pub fn new(ids: IdGenerator) -> Self {
        Self { ids }
    }

    /// Recognize every endpoint in a file
    pub fn parse_endpoints(file: &SourceFile, content: &str) -> Vec<EndpointDef> {
        let mut endpoints = Vec::new();

        let routers: Vec<(usize, String)> = ROUTER
            .captures_iter(content)
            .filter_map(|c| Some((c.get(0)?.start(), c.get(1)?.as_str().to_string())))
            .collect();

        let procedures: Vec<regex::Captures> = PROCEDURE.captures_iter(content).collect();
        for (i, cap) in procedures.iter().enumerate() {
            let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
                continue;
            };
            // The procedure chain runs until the next procedure starts
            let chain_end = procedures
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map(|m| m.start())
                .unwrap_or(content.len());
            let chain = &content[whole.end()..chain_end];

            let method = PROCEDURE_KIND
                .captures(chain)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| "procedure".to_string());
            let input_schema = PROCEDURE_INPUT
                .captures(chain)
                .and_then(|c| c.get(1))
                .map(|m| match m.as_str() {
                    s if s.starts_with("z.") => "inline".to_string(),
                    s => s.to_string(),
                });
            let router = routers
                .iter()
                .rev()
                .find(|(offset, _)| *offset < whole.start())
                .map(|(_, r)| r.clone());
            let qualified = match &router {
                Some(r) => format!("{}.{}", r.trim_end_matches("Router"), name.as_str()),
                None => name.as_str().to_string(),
            };

            endpoints.push(EndpointDef {
                name: qualified,
                method,
                router,
                route: None,
                input_schema,
                line: line_at(content, whole.start()),
            });
        }

        for cap in EXPRESS_ROUTE.captures_iter(content) {
            let (Some(whole), Some(method), Some(route)) = (cap.get(0), cap.get(1), cap.get(2))
            else {
                continue;
            };
            let method = method.as_str().to_uppercase();
            endpoints.push(EndpointDef {
                name: format!("{} {}", method, route.as_str()),
                method,
                router: None,
                route: Some(route.as_str().to_string()),
                input_schema: None,
                line: line_at(content, whole.start()),
            });
        }

        if file.file_name().starts_with("route.") {
            let route = next_route_path(&file.relative_path);
            for cap in NEXT_HANDLER.captures_iter(content) {
                let (Some(whole), Some(method)) = (cap.get(0), cap.get(1)) else {
                    continue;
                };
                endpoints.push(EndpointDef {
                    name: format!("{} {}", method.as_str(), route),
                    method: method.as_str().to_string(),
                    router: None,
                    route: Some(route.clone()),
                    input_schema: None,
                    line: line_at(content, whole.start()),
                });
            }
        }

        endpoints
    }
}

/// URL path of a Next.js route file (`apps/web/src/app/api/users/route.ts` -> `/api/users`)
fn next_route_path(relative_path: &str) -> String {
    let dir = relative_path
        .rsplit_once('/')
        .map(|(d, _)| d)
        .unwrap_or_default();
    let after_app = dir
        .split_once("/app/")
        .map(|(_, rest)| rest)
        .or_else(|| dir.strip_prefix("app/"))
        .unwrap_or(dir);
    format!("/{}", after_app)
}

impl Extractor for ApiExtractor {
    type Record = ApiFileRecord;

    fn name(&self) -> &'static str {
        "api"
    }

    fn node_types(&self) -> &'static [NodeType] {
        &[NodeType::File, NodeType::Api]
    }

    fn relation_types(&self) -> &'static [RelationType] {
        &[RelationType::Defines]
    }

    fn is_candidate(&self, file: &SourceFile) -> bool {
        file.has_extension(API_EXTENSIONS) && file.path_contains_any(API_PATH_KEYWORDS)
    }

    fn scan_file(
        &self,
        file: &SourceFile,
        content: &str,
    ) -> Result<Option<ApiFileRecord>, ExtractionError> {
        let endpoints = Self::parse_endpoints(file, content);
        if endpoints.is_empty() {
            return Ok(None);
        }
        Ok(Some(ApiFileRecord {
            file: file.clone(),
            hash: content_hash(content),
            line_count: content.lines().count() as u32,
            endpoints,
        }))
    }

    fn transform_to_graph(&self, records: Vec<ApiFileRecord>) -> GraphFragment {
        let mut fragment = GraphFragment::default();

        for record in records {
            let file = &record.file;
            let path = file.relative_path.as_str();
            let file_id = file_node_id(&self.ids, file);
            fragment.push_node(file_node(&self.ids, file, &record.hash, record.line_count));

            for endpoint in record.endpoints {
                let id = self.ids.node_id(
                    NodeType::Api,
                    file.package.as_deref(),
                    &endpoint.name,
                    IdExtra::typed(&endpoint.method, path),
                );
                fragment.push_relationship(GraphRelationship::new(
                    self.ids.relationship_id(RelationType::Defines, &file_id, &id),
                    RelationType::Defines,
                    file_id.clone(),
                    id.clone(),
                    EdgeProperties::Plain,
                ));
                fragment.push_node(GraphNode::new(
                    id,
                    endpoint.name,
                    NodeProperties::Api {
                        file_path: path.to_string(),
                        router: endpoint.router,
                        method: endpoint.method,
                        route: endpoint.route,
                        input_schema: endpoint.input_schema,
                        line: endpoint.line,
                    },
                    NodeMetadata::new(Some(path.to_string()), file.package.clone(), 0.9),
                ));
            }
        }

        fragment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn source(rel: &str) -> SourceFile {
        SourceFile {
            path: PathBuf::from(format!("/repo/{}", rel)),
            relative_path: rel.to_string(),
            package: Some("@repo/api".to_string()),
        }
    }

    #[test]
    fn test_trpc_procedures() {
        let content = r#"
export const userRouter = createTRPCRouter({
  byId: publicProcedure
    .input(z.object({ id: z.string() }))
    .query(({ ctx, input }) => ctx.db.user.findFirst()),
  create: protectedProcedure
    .input(CreateUserSchema)
    .mutation(async ({ ctx, input }) => {
      return ctx.db.user.create({ data: input });
    }),
});
"#;
        let endpoints =
            ApiExtractor::parse_endpoints(&source("packages/api/src/router/user.ts"), content);
        assert_eq!(endpoints.len(), 2);
        assert_eq!(endpoints[0].name, "user.byId");
        assert_eq!(endpoints[0].method, "query");
        assert_eq!(endpoints[0].input_schema.as_deref(), Some("inline"));
        assert_eq!(endpoints[1].name, "user.create");
        assert_eq!(endpoints[1].method, "mutation");
        assert_eq!(endpoints[1].input_schema.as_deref(), Some("CreateUserSchema"));
        assert_eq!(endpoints[1].router.as_deref(), Some("userRouter"));
    }

    #[test]
    fn test_express_routes() {
        let content = r#"
router.get("/users/:id", getUser);
router.post('/users', createUser);
"#;
        let endpoints = ApiExtractor::parse_endpoints(&source("server/routes/users.js"), content);
        let names: Vec<&str> = endpoints.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["GET /users/:id", "POST /users"]);
    }

    #[test]
    fn test_next_route_handlers() {
        let content = "export async function GET(req: Request) {}\nexport function POST() {}";
        let endpoints =
            ApiExtractor::parse_endpoints(&source("apps/web/src/app/api/users/route.ts"), content);
        let names: Vec<&str> = endpoints.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["GET /api/users", "POST /api/users"]);
    }

    #[test]
    fn test_transform_links_file_to_endpoints() {
        let ex = ApiExtractor::new(IdGenerator::default());
        let file = source("server/routes/users.js");
        let record = ex
            .scan_file(&file, "router.delete('/users/:id', remove);")
            .unwrap()
            .unwrap();
        let fragment = ex.transform_to_graph(vec![record]);
        assert_eq!(fragment.nodes.len(), 2);
        assert_eq!(fragment.relationships.len(), 1);
        assert_eq!(fragment.relationships[0].rel_type, RelationType::Defines);
        assert!(fragment
            .nodes
            .iter()
            .any(|n| n.node_type() == NodeType::Api && n.name == "DELETE /users/:id"));
    }
}
