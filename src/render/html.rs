use crate::render::embed_json;
use crate::view::MapData;

const PLACEHOLDER: &str = "__DATA__";

/// Render a self-contained HTML map (model embedded as JSON).
///
/// The template is a plain string with a placeholder rather than a `format!()`
/// string: the inline JS is full of `{}` from template literals.
pub fn render_html(data: &MapData) -> anyhow::Result<String> {
    let json = embed_json(data)?;

    const TEMPLATE: &str = r##"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Cities Web Map</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" crossorigin="">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js" crossorigin=""></script>
<style>
  html, body { height: 100%; margin: 0; }
  #map { position: absolute; inset: 0; }

  .city-pin { background: none; border: none; }
  .city-pin svg { filter: drop-shadow(0 1px 2px rgba(0, 0, 0, 0.45)); }

  .legend {
    background: rgba(255, 255, 255, 0.9);
    padding: 8px 10px;
    border-radius: 6px;
    font: 12px system-ui, -apple-system, Segoe UI, Roboto, Arial, sans-serif;
    box-shadow: 0 1px 4px rgba(0, 0, 0, 0.3);
  }
  .legend .caption { font-weight: 600; margin-bottom: 6px; }
  .legend .bar { display: flex; }
  .legend .swatch { width: 48px; height: 10px; }
  .legend .ticks { display: flex; }
  .legend .tick { width: 48px; font-variant-numeric: tabular-nums; color: #333; }
</style>
</head>
<body>
<div id="map"></div>

<script>
// Embedded map model (JSON object literal)
const DATA = __DATA__;

function escapeHtml(s) {
  return String(s)
    .replaceAll("&", "&amp;")
    .replaceAll("<", "&lt;")
    .replaceAll(">", "&gt;")
    .replaceAll('"', "&quot;")
    .replaceAll("'", "&#39;");
}

function fmtCompact(x) {
  if (x >= 1e6) return `${+(x / 1e6).toFixed(1)}M`;
  if (x >= 1e3) return `${+(x / 1e3).toFixed(1)}k`;
  return String(x);
}

function pinIcon(color) {
  const svg = `
    <svg xmlns="http://www.w3.org/2000/svg" width="24" height="36" viewBox="0 0 24 36">
      <path d="M12 0C5.4 0 0 5.4 0 12c0 9 12 24 12 24s12-15 12-24C24 5.4 18.6 0 12 0z"
            fill="${color}" stroke="#333" stroke-width="1"/>
      <circle cx="12" cy="12" r="4.5" fill="#fff"/>
    </svg>`;
  return L.divIcon({
    className: "city-pin",
    html: svg,
    iconSize: [24, 36],
    iconAnchor: [12, 36],
    popupAnchor: [0, -30],
  });
}

const map = L.map("map", { center: DATA.center, zoom: DATA.zoom_start });

// Base tile layers; exactly one is active on load.
const baseLayers = {};
for (const t of DATA.tiles) {
  const layer = L.tileLayer(t.url, { attribution: t.attribution, maxZoom: t.max_zoom });
  baseLayers[t.name] = layer;
  if (t.active) layer.addTo(map);
}

// City markers
const cities = L.featureGroup();
for (const m of DATA.cities.markers) {
  L.marker([m.lat, m.lon], { icon: pinIcon(m.color), title: m.tooltip })
    .bindPopup(escapeHtml(m.popup))
    .addTo(cities);
}
cities.addTo(map);

// Oceans
const os = DATA.oceans.style;
const oceans = L.geoJSON(DATA.oceans.geojson, {
  style: {
    color: os.color,
    weight: os.weight,
    opacity: os.opacity,
    fillColor: os.fill_color,
    fillOpacity: os.fill_opacity,
  },
}).addTo(map);

// Choropleth: regions[i] belongs to features[i].
const ch = DATA.choropleth;
const choropleth = L.featureGroup();
ch.geojson.features.forEach((feature, i) => {
  const r = ch.regions[i];
  const missing = r.value === null;
  const layer = L.geoJSON(feature, {
    style: {
      fillColor: r.fill,
      fillOpacity: missing ? ch.nan_fill_opacity : ch.fill_opacity,
      color: "black",
      weight: 1,
      opacity: ch.line_opacity,
    },
  });
  if (r.key !== null) {
    const label = missing ? "no data" : r.value.toLocaleString("en-US");
    layer.bindTooltip(`${escapeHtml(r.key)}: ${label}`, { sticky: true });
  }
  layer.addTo(choropleth);
});
choropleth.addTo(map);

// Threshold legend
const legend = L.control({ position: "topright" });
legend.onAdd = () => {
  const div = L.DomUtil.create("div", "legend");
  const lg = ch.legend;
  const swatches = lg.colors
    .map((c) => `<div class="swatch" style="background:${c}"></div>`)
    .join("");
  const ticks = lg.thresholds
    .map((t) => `<div class="tick">${fmtCompact(t)}</div>`)
    .join("");
  div.innerHTML = `
    <div class="caption">${escapeHtml(lg.caption)}</div>
    <div class="bar">${swatches}</div>
    <div class="ticks">${ticks}</div>
  `;
  return div;
};
legend.addTo(map);

if (DATA.controls.layer_control) {
  const overlays = {};
  overlays[DATA.cities.name] = cities;
  overlays[DATA.oceans.name] = oceans;
  overlays[ch.name] = choropleth;
  L.control.layers(baseLayers, overlays).addTo(map);
}

// Click anywhere for coordinates.
if (DATA.controls.lat_lng_popup) {
  map.on("click", (e) => {
    L.popup()
      .setLatLng(e.latlng)
      .setContent(
        `Latitude: ${e.latlng.lat.toFixed(4)}<br>Longitude: ${e.latlng.lng.toFixed(4)}`
      )
      .openOn(map);
  });
}
</script>
</body>
</html>
"##;

    Ok(TEMPLATE.replace(PLACEHOLDER, &json))
}
