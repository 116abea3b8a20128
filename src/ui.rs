use crate::models::Region;

/// Renders the page with one checkbox per configured region. Configured keys
/// passed `Region::parse`; names arriving with chart data are escaped by the
/// page script before they reach markup.
pub fn render_index(regions: &[Region]) -> String {
    let options: String = std::iter::once(region_option("all", "All States"))
        .chain(regions.iter().map(|region| region_option(region.as_str(), region.as_str())))
        .collect();
    INDEX_HTML.replace("{{REGION_OPTIONS}}", &options)
}

fn region_option(key: &str, label: &str) -> String {
    format!(
        r#"<label class="option"><input type="checkbox" data-region="{key}" /> <span>{label}</span></label>"#
    )
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Hit Statistics Dashboard</title>
  <style>
    :root {
      --ink: #1f2933;
      --muted: #6b7280;
      --accent: #2563eb;
      --line: #d9dee7;
      --surface: #ffffff;
      --danger: #b3261e;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      background: #f3f5f9;
      color: var(--ink);
      font-family: system-ui, "Segoe UI", Roboto, sans-serif;
    }

    .app {
      max-width: 1000px;
      margin: 0 auto;
      padding: 24px 16px 40px;
      display: grid;
      gap: 20px;
    }

    h1 {
      font-size: 1.8rem;
      margin: 0;
    }

    h2 {
      margin: 0 0 12px;
      font-size: 1.1rem;
    }

    .subtitle {
      margin: 4px 0 0;
      color: var(--muted);
    }

    .controls {
      display: flex;
      flex-wrap: wrap;
      gap: 16px;
      align-items: flex-end;
    }

    .field {
      display: grid;
      gap: 4px;
      font-size: 0.8rem;
      color: var(--muted);
    }

    input[type="date"], .dropdown-toggle {
      border: 1px solid var(--line);
      border-radius: 6px;
      padding: 8px 10px;
      font: inherit;
      background: var(--surface);
      color: var(--ink);
    }

    .dropdown {
      position: relative;
    }

    .dropdown-toggle {
      cursor: pointer;
      min-width: 150px;
      text-align: left;
    }

    .dropdown-menu {
      position: absolute;
      z-index: 10;
      margin-top: 4px;
      width: 220px;
      background: var(--surface);
      border: 1px solid var(--line);
      border-radius: 6px;
      padding: 8px;
      display: none;
    }

    .dropdown.open .dropdown-menu {
      display: block;
    }

    .dropdown-head {
      display: flex;
      justify-content: space-between;
      padding-bottom: 6px;
      border-bottom: 1px solid var(--line);
      font-weight: 600;
    }

    .dropdown-head button {
      border: none;
      background: none;
      color: var(--accent);
      cursor: pointer;
      font: inherit;
    }

    .options {
      max-height: 240px;
      overflow-y: auto;
      padding-top: 6px;
    }

    .option {
      display: flex;
      gap: 8px;
      padding: 4px;
    }

    .card {
      background: var(--surface);
      border: 1px solid var(--line);
      border-radius: 8px;
      padding: 16px;
    }

    svg {
      width: 100%;
      height: auto;
    }

    .chart-grid {
      stroke: var(--line);
    }

    .chart-label {
      font-size: 11px;
      fill: var(--muted);
    }

    .chart-line {
      fill: none;
      stroke-width: 2;
    }

    .legend {
      display: flex;
      flex-wrap: wrap;
      gap: 12px;
      font-size: 0.9rem;
      margin-top: 8px;
    }

    .legend span::before {
      content: "";
      display: inline-block;
      width: 10px;
      height: 10px;
      border-radius: 50%;
      margin-right: 6px;
      background: var(--swatch);
    }

    .spinner {
      justify-self: center;
      width: 40px;
      height: 40px;
      border-radius: 50%;
      border: 3px solid var(--line);
      border-bottom-color: var(--accent);
      animation: spin 900ms linear infinite;
      display: none;
    }

    body.loading .spinner {
      display: block;
    }

    body.loading .charts {
      display: none;
    }

    .charts {
      display: grid;
      gap: 20px;
    }

    .status {
      min-height: 1.2em;
      color: var(--danger);
    }

    @keyframes spin {
      to { transform: rotate(360deg); }
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Hit Statistics Dashboard</h1>
      <p class="subtitle">Profile keyword hits per state over time.</p>
    </header>

    <section class="controls">
      <label class="field">Start date <input type="date" id="start-date" /></label>
      <label class="field">End date <input type="date" id="end-date" /></label>
      <div class="dropdown" id="region-dropdown">
        <span class="field">States</span>
        <button class="dropdown-toggle" id="region-toggle" type="button">States: All</button>
        <div class="dropdown-menu">
          <div class="dropdown-head">
            <span>Select states</span>
            <button type="button" id="region-reset">Reset</button>
          </div>
          <div class="options">{{REGION_OPTIONS}}</div>
        </div>
      </div>
    </section>

    <div class="status" id="status"></div>
    <div class="spinner" aria-label="Loading"></div>

    <section class="charts">
      <div class="card">
        <h2>Hits over time</h2>
        <svg id="trend-chart" viewBox="0 0 760 320" role="img" aria-label="Hits over time"></svg>
        <div class="legend" id="trend-legend"></div>
      </div>

      <div class="card">
        <h2>State distribution</h2>
        <label class="field">Date <input type="date" id="cursor-date" /></label>
        <svg id="pie-chart" viewBox="0 0 760 360" role="img" aria-label="State distribution"></svg>
        <div class="legend" id="pie-legend"></div>
      </div>
    </section>
  </main>

  <script>
    const startEl = document.getElementById('start-date');
    const endEl = document.getElementById('end-date');
    const cursorEl = document.getElementById('cursor-date');
    const dropdownEl = document.getElementById('region-dropdown');
    const toggleEl = document.getElementById('region-toggle');
    const resetEl = document.getElementById('region-reset');
    const statusEl = document.getElementById('status');
    const trendEl = document.getElementById('trend-chart');
    const trendLegendEl = document.getElementById('trend-legend');
    const pieEl = document.getElementById('pie-chart');
    const pieLegendEl = document.getElementById('pie-legend');
    const checkboxes = Array.from(document.querySelectorAll('[data-region]'));
    const controls = [startEl, endEl, cursorEl, toggleEl, resetEl, ...checkboxes];

    let dropdownOpen = false;

    const escapeHtml = (text) => String(text).replace(/[&<>"']/g, (ch) => ({
      '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;'
    })[ch]);

    const color = (index) => `hsl(${(index * 137.5) % 360}, 70%, 45%)`;

    const setStatus = (message) => {
      statusEl.textContent = message || '';
    };

    const setLoading = (loading) => {
      document.body.classList.toggle('loading', loading);
      controls.forEach((el) => { el.disabled = loading; });
    };

    const setDropdown = (open) => {
      dropdownOpen = open;
      dropdownEl.classList.toggle('open', open);
    };

    const renderControls = (view) => {
      startEl.value = view.window.start;
      endEl.value = view.window.end;
      cursorEl.value = view.cursor;
      cursorEl.min = view.window.start;
      cursorEl.max = view.window.end;

      const selected = view.selection.mode === 'all' ? ['all'] : view.selection.regions;
      checkboxes.forEach((box) => {
        box.checked = selected.includes(box.dataset.region);
      });
      toggleEl.textContent = view.selection.mode === 'all'
        ? 'States: All'
        : `States: ${view.selection.regions.length}`;
    };

    const renderTrend = (view) => {
      const width = 760;
      const height = 320;
      const padX = 48;
      const padY = 56;
      const top = 20;
      const points = view.trend;
      const labels = view.selection.mode === 'all' ? ['total'] : view.selection.regions;

      if (!points.length || !labels.length) {
        trendEl.innerHTML = '<text class="chart-label" x="50%" y="50%" text-anchor="middle">No data</text>';
        trendLegendEl.innerHTML = '';
        return;
      }

      const values = points.flatMap((point) => labels.map((label) => point.values[label] || 0));
      let min = Math.min(0, ...values);
      let max = Math.max(0, ...values);
      if (min === max) {
        max += 1;
      }
      const xStep = points.length > 1 ? (width - padX * 2) / (points.length - 1) : 0;
      const x = (index) => padX + index * xStep;
      const y = (value) => height - padY - ((value - min) * (height - top - padY)) / (max - min);

      let grid = '';
      for (let i = 0; i <= 4; i += 1) {
        const value = min + ((max - min) * i) / 4;
        grid += `<line class="chart-grid" x1="${padX}" y1="${y(value)}" x2="${width - padX}" y2="${y(value)}" />`;
        grid += `<text class="chart-label" x="${padX - 8}" y="${y(value) + 4}" text-anchor="end">${Math.round(value)}</text>`;
      }

      const every = Math.max(1, Math.ceil(points.length / 12));
      const xLabels = points
        .map((point, index) => index % every === 0
          ? `<text class="chart-label" transform="translate(${x(index)}, ${height - padY + 14}) rotate(-45)" text-anchor="end">${escapeHtml(point.date)}</text>`
          : '')
        .join('');

      const lines = labels
        .map((label, index) => {
          const stroke = label === 'total' ? '#2563eb' : color(index);
          const d = points
            .map((point, i) => `${i === 0 ? 'M' : 'L'} ${x(i).toFixed(2)} ${y(point.values[label] || 0).toFixed(2)}`)
            .join(' ');
          return `<path class="chart-line" stroke="${stroke}" d="${d}" />`;
        })
        .join('');

      trendEl.innerHTML = `${grid}${lines}${xLabels}`;
      trendLegendEl.innerHTML = labels
        .map((label, index) => {
          const swatch = label === 'total' ? '#2563eb' : color(index);
          const name = label === 'total' ? 'All States' : label;
          return `<span style="--swatch: ${swatch}">${escapeHtml(name)}</span>`;
        })
        .join('');
    };

    const renderPie = (view) => {
      const slices = view.distribution.slices;
      const total = view.distribution.total;
      if (!slices.length || total <= 0) {
        pieEl.innerHTML = '<text class="chart-label" x="50%" y="50%" text-anchor="middle">No data for this date</text>';
        pieLegendEl.innerHTML = '';
        return;
      }

      const cx = 380;
      const cy = 180;
      const r = 150;
      let angle = -Math.PI / 2;
      const parts = slices.map((slice, index) => {
        const share = slice.percent || 0;
        const sweep = share * Math.PI * 2;
        const end = angle + sweep;
        const large = sweep > Math.PI ? 1 : 0;
        const x1 = cx + r * Math.cos(angle);
        const y1 = cy + r * Math.sin(angle);
        const x2 = cx + r * Math.cos(end);
        const y2 = cy + r * Math.sin(end);
        const mid = angle + sweep / 2;
        angle = end;
        const name = escapeHtml(slice.name);
        const title = `<title>${name}: ${(share * 100).toFixed(2)}% (Value: ${slice.value})</title>`;
        const shape = share >= 0.9999
          ? `<circle cx="${cx}" cy="${cy}" r="${r}" fill="${color(index)}">${title}</circle>`
          : `<path d="M ${cx} ${cy} L ${x1} ${y1} A ${r} ${r} 0 ${large} 1 ${x2} ${y2} Z" fill="${color(index)}">${title}</path>`;
        const label = share > 0.05
          ? `<text class="chart-label" x="${cx + (r + 24) * Math.cos(mid)}" y="${cy + (r + 24) * Math.sin(mid)}" text-anchor="middle">${name}: ${(share * 100).toFixed(2)}%</text>`
          : '';
        return shape + label;
      });

      pieEl.innerHTML = parts.join('');
      pieLegendEl.innerHTML = slices
        .map((slice, index) => `<span style="--swatch: ${color(index)}">${escapeHtml(slice.name)}</span>`)
        .join('');
    };

    const render = (view) => {
      setLoading(view.loading);
      setStatus(view.error);
      renderControls(view);
      renderTrend(view);
      renderPie(view);
    };

    const send = async (path, body) => {
      const res = await fetch(path, {
        method: 'POST',
        headers: { 'content-type': 'application/json' },
        body: body === undefined ? undefined : JSON.stringify(body)
      });
      if (!res.ok) {
        const msg = await res.text();
        throw new Error(msg || 'Request failed');
      }
      return res.json();
    };

    const load = async () => {
      const res = await fetch('/api/dashboard');
      if (!res.ok) {
        throw new Error('Unable to load dashboard');
      }
      render(await res.json());
    };

    const editWindow = async (edge, date) => {
      if (!date) {
        return;
      }
      setStatus('');
      setLoading(true);
      try {
        render(await send(`/api/window/${edge}`, { date }));
      } catch (err) {
        setStatus(err.message);
        await load();
      }
    };

    startEl.addEventListener('change', () => editWindow('start', startEl.value));
    endEl.addEventListener('change', () => editWindow('end', endEl.value));

    cursorEl.addEventListener('change', () => {
      if (!cursorEl.value) {
        return;
      }
      send('/api/cursor', { date: cursorEl.value })
        .then(render)
        .catch((err) => setStatus(err.message));
    });

    checkboxes.forEach((box) => {
      box.addEventListener('change', () => {
        send('/api/selection/toggle', { region: box.dataset.region })
          .then(render)
          .catch((err) => setStatus(err.message));
      });
    });

    toggleEl.addEventListener('click', () => setDropdown(!dropdownOpen));

    resetEl.addEventListener('click', () => {
      setDropdown(false);
      send('/api/selection/reset')
        .then(render)
        .catch((err) => setStatus(err.message));
    });

    document.addEventListener('mousedown', (event) => {
      if (dropdownOpen && !dropdownEl.contains(event.target)) {
        setDropdown(false);
      }
    });

    load().catch((err) => setStatus(err.message));
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_lists_all_option_and_regions() {
        let regions = vec![Region::parse("NY").unwrap(), Region::parse("TX").unwrap()];
        let page = render_index(&regions);
        assert!(page.contains(r#"data-region="all""#));
        assert!(page.contains(r#"data-region="NY""#));
        assert!(page.contains(r#"data-region="TX""#));
        assert!(!page.contains("{{REGION_OPTIONS}}"));
    }

    #[test]
    fn script_escapes_names_from_chart_data() {
        let page = render_index(&[]);
        assert!(page.contains("const escapeHtml"));
        for raw in ["${slice.name}", "${point.date}", "${name}</span>"] {
            assert!(!page.contains(raw), "unescaped {raw} in page");
        }
        assert!(page.contains("escapeHtml(slice.name)"));
        assert!(page.contains("setStatus(view.error)"));
    }
}
