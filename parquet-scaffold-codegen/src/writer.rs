use indoc::formatdoc;
use std::{collections::HashMap, fs, path::Path};
use tracing::info;

use crate::Error;

#[derive(Debug)]
pub struct WriterOutput {
    pub files: Vec<OutputFile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub name: String,
    pub content: String,
}

impl WriterOutput {
    /// Write every file into `dir`, replacing files of the same name
    pub fn write_to<P: AsRef<Path>>(&self, dir: P) -> Result<(), Error> {
        let dir = dir.as_ref();
        for OutputFile { name, content } in &self.files {
            let path = dir.join(name);
            fs::write(&path, content)?;
            info!("Generating {}", path.display());
        }
        Ok(())
    }
}

/// Writes the serializer, view and route modules of a Django REST app
#[derive(Clone, Debug)]
pub struct ApiWriter {
    pub(crate) entities: Vec<String>,
}

impl ApiWriter {
    /// Exact duplicate names are kept once. Distinct names that would share
    /// a route are rejected.
    pub fn new<I, S>(entities: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut routes: HashMap<String, String> = HashMap::new();
        let mut unique = Vec::new();
        for entity in entities {
            let entity = entity.into();
            if entity.is_empty() || !entity.chars().all(|c| c == '_' || c.is_alphanumeric()) {
                return Err(Error::TransformError(format!(
                    "'{entity}' is not a valid class name"
                )));
            }
            match routes.get(&route_key(&entity)) {
                Some(first) if *first == entity => continue,
                Some(first) => {
                    return Err(Error::RouteCollision {
                        route: route_key(&entity),
                        first: first.clone(),
                        second: entity,
                    });
                }
                None => {
                    routes.insert(route_key(&entity), entity.clone());
                    unique.push(entity);
                }
            }
        }
        Ok(Self { entities: unique })
    }

    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    pub fn generate(&self) -> WriterOutput {
        WriterOutput {
            files: vec![
                self.write_serializers(),
                self.write_views(),
                self.write_urls(),
            ],
        }
    }

    pub fn write_serializers(&self) -> OutputFile {
        let mut code = String::from("from rest_framework import serializers\n");
        code.push_str(&import_block(".models", self.entities.iter().cloned()));
        for entity in &self.entities {
            code.push('\n');
            code.push_str(&formatdoc! {"
                class {entity}Serializer(serializers.ModelSerializer):
                    class Meta:
                        model = {entity}
                        fields = '__all__'
            "});
        }
        OutputFile {
            name: "serializers.py".to_owned(),
            content: code,
        }
    }

    pub fn write_views(&self) -> OutputFile {
        let mut code = String::from("from rest_framework import viewsets\n");
        code.push_str(&import_block(".models", self.entities.iter().cloned()));
        code.push_str(&import_block(
            ".serializers",
            self.entities.iter().map(|e| format!("{e}Serializer")),
        ));
        for entity in &self.entities {
            code.push('\n');
            code.push_str(&formatdoc! {"
                class {entity}ViewSet(viewsets.ModelViewSet):
                    queryset = {entity}.objects.all()
                    serializer_class = {entity}Serializer
            "});
        }
        OutputFile {
            name: "views.py".to_owned(),
            content: code,
        }
    }

    pub fn write_urls(&self) -> OutputFile {
        let mut code = String::from(
            "from django.urls import path, include\nfrom rest_framework.routers import DefaultRouter\n",
        );
        code.push_str(&import_block(
            ".views",
            self.entities.iter().map(|e| format!("{e}ViewSet")),
        ));
        code.push_str("router = DefaultRouter()\n");
        for entity in &self.entities {
            let route = route_key(entity);
            code.push_str(&format!(
                "router.register(r'{route}', {entity}ViewSet, basename='{route}')\n"
            ));
        }
        code.push_str("\nurlpatterns = [\n    path('', include(router.urls)),\n]\n");
        OutputFile {
            name: "urls.py".to_owned(),
            content: code,
        }
    }
}

/// A parenthesized `from <module> import (...)` block followed by a blank line
fn import_block<I>(module: &str, names: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut block = format!("from {module} import (\n");
    for name in names {
        block.push_str(&format!("    {name},\n"));
    }
    let trimmed_len = block.trim_end_matches([',', '\n']).len();
    block.truncate(trimmed_len);
    block.push_str("\n)\n\n");
    block
}

fn route_key(entity: &str) -> String {
    entity.to_lowercase()
}
