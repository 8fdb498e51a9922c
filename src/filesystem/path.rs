use super::Filesystem;
use crate::structs::ROOT_INODE;
use crate::Error;

/// Split an absolute path into its components. `/` yields no components
pub(crate) fn split_path(path: &str) -> Result<Vec<&str>, Error> {
    let Some(relative) = path.strip_prefix('/') else {
        return Err(Error::InvalidPath);
    };
    Ok(relative.split('/').filter(|c| !c.is_empty()).collect())
}

/// Split an absolute path into its parent's components and the final name
pub(crate) fn split_parent(path: &str) -> Result<(Vec<&str>, &str), Error> {
    let mut components = split_path(path)?;
    let name = components.pop().ok_or(Error::InvalidPath)?;
    Ok((components, name))
}

impl Filesystem {
    /// Inode index of the file or directory at an absolute path
    pub fn resolve_path(&mut self, path: &str) -> Result<u32, Error> {
        let components = split_path(path)?;
        self.resolve_components(&components)
    }

    pub(crate) fn resolve_components(&mut self, components: &[&str]) -> Result<u32, Error> {
        let mut current = ROOT_INODE;
        for component in components {
            current = self
                .lookup(current, component)?
                .ok_or(Error::NameNotFound)?
                .inode;
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::{split_parent, split_path};
    use crate::Error;

    #[test]
    fn components() {
        assert_eq!(split_path("/").unwrap(), Vec::<&str>::new());
        assert_eq!(split_path("/a/b/c").unwrap(), vec!["a", "b", "c"]);
        assert_eq!(split_path("//a///b/").unwrap(), vec!["a", "b"]);
        assert!(matches!(split_path("a/b"), Err(Error::InvalidPath)));
        assert!(matches!(split_path(""), Err(Error::InvalidPath)));
    }

    #[test]
    fn input_left_untouched() {
        let path = String::from("/usr/share");
        let components = split_path(&path).unwrap();
        assert_eq!(components, vec!["usr", "share"]);
        assert_eq!(path, "/usr/share");
    }

    #[test]
    fn parent() {
        assert_eq!(split_parent("/a/b").unwrap(), (vec!["a"], "b"));
        assert_eq!(split_parent("/a").unwrap(), (vec![], "a"));
        assert!(matches!(split_parent("/"), Err(Error::InvalidPath)));
    }
}
