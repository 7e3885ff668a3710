//! Encodings: channel bindings plus node-local controls.
//!
//! Only the channel map is inherited down the view tree. `coordinates` and
//! `layout` belong to the node that declares them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::definition::Definition;
use super::layout::Layout;

/// A visual channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Horizontal position.
    X,
    /// Vertical position.
    Y,
    /// Depth, for 3D layouts.
    Z,
    /// Mark color or group background color.
    Color,
    /// Mark shape.
    Shape,
    /// Opacity.
    Opacity,
    /// Mark or group size.
    Size,
    /// Rotation angle.
    Angle,
    /// Grouping only; never drawn.
    Detail,
}

impl Channel {
    /// Every channel, in declaration order.
    pub const ALL: [Channel; 9] = [
        Channel::X,
        Channel::Y,
        Channel::Z,
        Channel::Color,
        Channel::Shape,
        Channel::Opacity,
        Channel::Size,
        Channel::Angle,
        Channel::Detail,
    ];

    /// Whether this channel produces a visual property.
    #[must_use]
    pub fn is_visual(self) -> bool {
        self != Channel::Detail
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::X => "x",
            Channel::Y => "y",
            Channel::Z => "z",
            Channel::Color => "color",
            Channel::Shape => "shape",
            Channel::Opacity => "opacity",
            Channel::Size => "size",
            Channel::Angle => "angle",
            Channel::Detail => "detail",
        };
        f.write_str(name)
    }
}

/// Coordinate system of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coordinates {
    /// Cartesian (x, y).
    #[default]
    Cartesian,
    /// Radial (angle, radius).
    Radial,
}

/// The inheritable part of an encoding: channel to definition.
///
/// Merging produces a new map; the inputs are never modified, so sibling
/// branches of a view tree stay isolated.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Channels(BTreeMap<Channel, Definition>);

impl Channels {
    /// An empty channel map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Definition bound to a channel.
    #[must_use]
    pub fn get(&self, channel: Channel) -> Option<&Definition> {
        self.0.get(&channel)
    }

    /// Bind a channel.
    pub fn insert(&mut self, channel: Channel, def: Definition) {
        self.0.insert(channel, def);
    }

    /// Bound channels in channel order.
    pub fn iter(&self) -> impl Iterator<Item = (Channel, &Definition)> + '_ {
        self.0.iter().map(|(c, d)| (*c, d))
    }

    /// Number of bound channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no channel is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy of `self` with every channel bound in `overrides` replaced.
    #[must_use]
    pub fn merged_with(&self, overrides: &Channels) -> Channels {
        let mut out = self.clone();
        for (channel, def) in overrides.iter() {
            out.insert(channel, def.clone());
        }
        out
    }

    /// Field names referenced by the channels, deduplicated, in channel order.
    #[must_use]
    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for (_, def) in self.iter() {
            if let Some(field) = def.field_name() {
                if !names.iter().any(|n| n == field) {
                    names.push(field.to_string());
                }
            }
        }
        names
    }
}

impl FromIterator<(Channel, Definition)> for Channels {
    fn from_iter<I: IntoIterator<Item = (Channel, Definition)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Channel bindings plus the node-local `coordinates` and `layout` controls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Encoding {
    /// Horizontal position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<Definition>,
    /// Vertical position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<Definition>,
    /// Depth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<Definition>,
    /// Mark color or group background color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Definition>,
    /// Shape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Definition>,
    /// Opacity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<Definition>,
    /// Size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Definition>,
    /// Angle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<Definition>,
    /// Group-by field; also drives faceting of a single nested view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Definition>,
    /// Coordinate system used by this node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    /// How children or facets of this node are arranged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
}

impl Encoding {
    /// Create an empty encoding.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind x.
    #[must_use]
    pub fn x(self, def: Definition) -> Self {
        self.channel(Channel::X, def)
    }

    /// Bind y.
    #[must_use]
    pub fn y(self, def: Definition) -> Self {
        self.channel(Channel::Y, def)
    }

    /// Bind color.
    #[must_use]
    pub fn color(self, def: Definition) -> Self {
        self.channel(Channel::Color, def)
    }

    /// Bind size.
    #[must_use]
    pub fn size(self, def: Definition) -> Self {
        self.channel(Channel::Size, def)
    }

    /// Bind detail.
    #[must_use]
    pub fn detail(self, def: Definition) -> Self {
        self.channel(Channel::Detail, def)
    }

    /// Bind any channel.
    #[must_use]
    pub fn channel(mut self, channel: Channel, def: Definition) -> Self {
        *self.slot_mut(channel) = Some(def);
        self
    }

    /// Set the coordinate system.
    #[must_use]
    pub fn coordinates(mut self, coordinates: Coordinates) -> Self {
        self.coordinates = Some(coordinates);
        self
    }

    /// Set the layout.
    #[must_use]
    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Definition bound to a channel.
    #[must_use]
    pub fn get(&self, channel: Channel) -> Option<&Definition> {
        match channel {
            Channel::X => self.x.as_ref(),
            Channel::Y => self.y.as_ref(),
            Channel::Z => self.z.as_ref(),
            Channel::Color => self.color.as_ref(),
            Channel::Shape => self.shape.as_ref(),
            Channel::Opacity => self.opacity.as_ref(),
            Channel::Size => self.size.as_ref(),
            Channel::Angle => self.angle.as_ref(),
            Channel::Detail => self.detail.as_ref(),
        }
    }

    fn slot_mut(&mut self, channel: Channel) -> &mut Option<Definition> {
        match channel {
            Channel::X => &mut self.x,
            Channel::Y => &mut self.y,
            Channel::Z => &mut self.z,
            Channel::Color => &mut self.color,
            Channel::Shape => &mut self.shape,
            Channel::Opacity => &mut self.opacity,
            Channel::Size => &mut self.size,
            Channel::Angle => &mut self.angle,
            Channel::Detail => &mut self.detail,
        }
    }

    /// The inheritable channel map of this encoding.
    #[must_use]
    pub fn channels(&self) -> Channels {
        Channel::ALL
            .iter()
            .filter_map(|&c| self.get(c).map(|d| (c, d.clone())))
            .collect()
    }

    /// The field named by this node's own `detail`, if it is a field reference.
    #[must_use]
    pub fn detail_field(&self) -> Option<&str> {
        self.detail.as_ref().and_then(Definition::field_name)
    }
}

impl From<&Channels> for Encoding {
    fn from(channels: &Channels) -> Self {
        channels
            .iter()
            .fold(Encoding::new(), |enc, (c, d)| enc.channel(c, d.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::layout::LayoutKind;

    #[test]
    fn test_encoding_parse() {
        let enc: Encoding = serde_json::from_str(
            r#"{"x": {"field": "foo"}, "color": "steelblue", "layout": "horizontal", "coordinates": "radial"}"#,
        )
        .unwrap();
        assert_eq!(enc.x, Some(Definition::field("foo")));
        assert_eq!(enc.color, Some(Definition::literal("steelblue")));
        assert_eq!(enc.layout.map(|l| l.kind), Some(LayoutKind::Horizontal));
        assert_eq!(enc.coordinates, Some(Coordinates::Radial));
    }

    #[test]
    fn test_encoding_rejects_unknown_channel() {
        let result: Result<Encoding, _> = serde_json::from_str(r#"{"fill": "red"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_channels_exclude_controls() {
        let enc = Encoding::new()
            .x(Definition::field("foo"))
            .detail(Definition::field("baz"))
            .layout(Layout::horizontal());
        let channels = enc.channels();
        assert_eq!(channels.len(), 2);
        assert_eq!(channels.field_names(), vec!["foo".to_string(), "baz".to_string()]);
    }

    #[test]
    fn test_channels_merge_child_wins() {
        let parent: Channels = [
            (Channel::X, Definition::field("foo")),
            (Channel::Size, Definition::literal(30)),
        ]
        .into_iter()
        .collect();
        let child: Channels = [(Channel::X, Definition::field("baz"))].into_iter().collect();

        let merged = parent.merged_with(&child);
        assert_eq!(merged.get(Channel::X), Some(&Definition::field("baz")));
        assert_eq!(merged.get(Channel::Size), Some(&Definition::literal(30)));
        assert_eq!(parent.get(Channel::X), Some(&Definition::field("foo")));
    }

    #[test]
    fn test_encoding_from_channels_round_trip() {
        let enc = Encoding::new().y(Definition::quantitative("bar")).color(Definition::literal("red"));
        assert_eq!(Encoding::from(&enc.channels()), enc);
    }

    #[test]
    fn test_detail_field() {
        let enc = Encoding::new().detail(Definition::field("baz"));
        assert_eq!(enc.detail_field(), Some("baz"));
        let enc = Encoding::new().detail(Definition::literal("fixed"));
        assert_eq!(enc.detail_field(), None);
    }

    #[test]
    fn test_channel_is_visual() {
        assert!(Channel::X.is_visual());
        assert!(!Channel::Detail.is_visual());
    }
}
