use tracing::{debug, info};

use crate::models::config::ConfigPatch;
use crate::ChatWidget;

type WidgetFactory = Box<dyn Fn() -> ChatWidget + Send + Sync>;

/// The page-level handle a host uses to mount and tear down the widget.
///
/// At most one instance is mounted at a time: `init` replaces whatever was
/// there. How a fresh store is built (storage, assistant, data source) is up
/// to the factory.
pub struct WidgetHost {
    factory: WidgetFactory,
    instance: Option<ChatWidget>,
}

impl std::fmt::Debug for WidgetHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetHost")
            .field("instance", &self.instance)
            .finish_non_exhaustive()
    }
}

impl Default for WidgetHost {
    fn default() -> Self {
        Self::new(ChatWidget::create_new)
    }
}

impl WidgetHost {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> ChatWidget + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            instance: None,
        }
    }

    /// Mount a new instance with `config` merged over the persisted
    /// configuration. An existing instance is destroyed first.
    pub fn init(&mut self, config: ConfigPatch) -> &mut ChatWidget {
        if self.destroy() {
            debug!("replacing mounted widget");
        }
        let mut widget = (self.factory)();
        widget.update_config(config);
        info!("widget mounted");
        self.instance.insert(widget)
    }

    /// Mount from script-tag `data-*` attributes.
    pub fn init_from_data_attributes<'a, I>(&mut self, attributes: I) -> &mut ChatWidget
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.init(ConfigPatch::from_data_attributes(attributes))
    }

    /// Unmount the current instance. Returns whether one was mounted.
    pub fn destroy(&mut self) -> bool {
        match self.instance.take() {
            Some(mut widget) => {
                if widget.has_unsaved_changes() {
                    if let Err(e) = widget.save() {
                        tracing::warn!(error = %e, "unsaved changes lost on unmount");
                    }
                }
                info!("widget unmounted");
                true
            }
            None => false,
        }
    }

    /// Forward a configuration change to the mounted instance.
    /// Returns `false` if nothing is mounted.
    pub fn update_config(&mut self, config: ConfigPatch) -> bool {
        match self.instance.as_mut() {
            Some(widget) => {
                widget.update_config(config);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.instance.is_some()
    }

    #[must_use]
    pub fn instance(&self) -> Option<&ChatWidget> {
        self.instance.as_ref()
    }

    pub fn instance_mut(&mut self) -> Option<&mut ChatWidget> {
        self.instance.as_mut()
    }
}
