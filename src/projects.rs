use serde::Serialize;

use crate::locale::Locale;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectCategory {
    Websites,
    Tools,
    Games,
    Minecraft,
    Other,
}

struct Project {
    id: &'static str,
    name_key: &'static str,
    description_key: &'static str,
    category: ProjectCategory,
    url: &'static str,
}

/// The showcase is static data. Names and descriptions are translation
/// keys; the UI resolves them for the active locale.
const PROJECTS: [Project; 7] = [
    Project {
        id: "kaia",
        name_key: "projects.kaia.title",
        description_key: "projects.kaia.desc",
        category: ProjectCategory::Tools,
        url: "https://github.com/GabrielOlvH/Kaia",
    },
    Project {
        id: "blog",
        name_key: "projects.blog.title",
        description_key: "projects.blog.desc",
        category: ProjectCategory::Websites,
        url: "https://github.com/GabrielOlvH/md.gabrielolv.dev",
    },
    Project {
        id: "cafeteria_website",
        name_key: "projects.cafeteria_development_website.title",
        description_key: "projects.cafeteria_development_website.desc",
        category: ProjectCategory::Websites,
        url: "https://cafeteria.dev",
    },
    Project {
        id: "industrial_revolution",
        name_key: "projects.industrial_revolution.title",
        description_key: "projects.industrial_revolution.desc",
        category: ProjectCategory::Minecraft,
        url: "https://github.com/GabrielOlvH/Industrial-Revolution",
    },
    Project {
        id: "multiple_minecraft_mods",
        name_key: "projects.multiple_minecraft_mods.title",
        description_key: "projects.multiple_minecraft_mods.desc",
        category: ProjectCategory::Minecraft,
        url: "https://modrinth.com/user/GabrielOlvH",
    },
    Project {
        id: "castor_odyssey",
        name_key: "projects.castor_odyssey.title",
        description_key: "projects.castor_odyssey.desc",
        category: ProjectCategory::Games,
        url: "https://gabrielolvh.itch.io/castors-odyssey",
    },
    Project {
        id: "pokemon_tcg_replay",
        name_key: "projects.pokemon_tcg_replay.title",
        description_key: "projects.pokemon_tcg_replay.desc",
        category: ProjectCategory::Games,
        url: "https://github.com/GabrielOlvH/TCGReplay",
    },
];

/// One showcase item as served to the UI's file-explorer view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectEntry {
    pub id: &'static str,
    pub name_key: &'static str,
    pub description_key: &'static str,
    pub category: ProjectCategory,
    pub url: &'static str,
    pub path: String,
    pub external: bool,
}

pub fn projects_for_locale(locale: Locale) -> Vec<ProjectEntry> {
    PROJECTS
        .iter()
        .map(|project| ProjectEntry {
            id: project.id,
            name_key: project.name_key,
            description_key: project.description_key,
            category: project.category,
            url: project.url,
            path: format!("/{}/projects/{}", locale, project.id),
            external: true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_projects_listed_for_every_locale() {
        for locale in Locale::ALL {
            let entries = projects_for_locale(locale);
            assert_eq!(entries.len(), PROJECTS.len());
            for entry in &entries {
                assert!(entry.path.starts_with(&format!("/{}/projects/", locale)));
                assert!(entry.external);
            }
        }
    }

    #[test]
    fn test_entry_shape() {
        let entries = projects_for_locale(Locale::Pt);
        let blog = entries.iter().find(|entry| entry.id == "blog").unwrap();
        assert_eq!(blog.category, ProjectCategory::Websites);
        assert_eq!(blog.path, "/pt/projects/blog");
        assert_eq!(blog.name_key, "projects.blog.title");
    }
}
