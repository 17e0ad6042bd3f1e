#[derive(Debug, Clone)]
pub struct FileNameTemplate {
  template: String,
}

impl FileNameTemplate {
  pub fn new(template: String) -> Self {
    Self { template }
  }
}

impl From<String> for FileNameTemplate {
  fn from(template: String) -> Self {
    Self { template }
  }
}

impl From<&str> for FileNameTemplate {
  fn from(template: &str) -> Self {
    Self {
      template: template.to_string(),
    }
  }
}

#[derive(Debug, Default)]
pub struct RenderOptions<'me> {
  pub name: Option<&'me str>,
  pub hash: Option<&'me str>,
}

impl FileNameTemplate {
  pub fn render(&self, options: RenderOptions) -> String {
    let mut tmp = self.template.clone();
    if let Some(name) = options.name {
      tmp = tmp.replace("[name]", name);
    }
    if let Some(hash) = options.hash {
      tmp = tmp.replace("[hash]", hash);
    }
    tmp
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn render_name_and_hash() {
    let template = FileNameTemplate::from("[name]-[hash].js");
    assert_eq!(
      template.render(RenderOptions {
        name: Some("chunk"),
        hash: Some("1a2b3c4d"),
      }),
      "chunk-1a2b3c4d.js"
    );
    assert_eq!(
      FileNameTemplate::from("[name].js").render(RenderOptions {
        name: Some("main"),
        hash: None,
      }),
      "main.js"
    );
  }
}
