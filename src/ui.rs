use crate::models::DashboardView;

pub fn render_index(view: &DashboardView) -> String {
    INDEX_HTML
        .replace("{{DAY_LABEL}}", &view.day_label)
        .replace("{{SERVED}}", &view.summary.total_served.to_string())
        .replace("{{SUBSCRIBED}}", &view.summary.total_subscribed.to_string())
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Bhog Distribution</title>
  <style>
    :root {
      --bg: #0f172a;
      --panel: #1e293b;
      --line: #334155;
      --ink: #e2e8f0;
      --muted: #94a3b8;
      --accent: #fbbf24;
      --plus: #16a34a;
      --minus: #e11d48;
      --danger: #f87171;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Segoe UI", "Trebuchet MS", sans-serif;
      padding: 16px;
    }

    .app {
      width: min(960px, 100%);
      margin: 0 auto;
      display: grid;
      gap: 18px;
    }

    header {
      text-align: center;
    }

    h1 {
      color: var(--accent);
      margin: 12px 0 4px;
      letter-spacing: 0.04em;
    }

    .subtitle {
      margin: 0;
      color: var(--muted);
    }

    .summary {
      position: sticky;
      top: 8px;
      z-index: 2;
      background: rgba(30, 41, 59, 0.92);
      border: 1px solid var(--line);
      border-radius: 14px;
      padding: 14px;
      text-align: center;
    }

    .summary .value {
      font-size: 1.6rem;
      font-weight: 700;
      color: var(--accent);
    }

    .bar {
      height: 10px;
      background: var(--line);
      border-radius: 999px;
      overflow: hidden;
      margin-top: 8px;
    }

    .bar span {
      display: block;
      height: 100%;
      width: 0;
      background: var(--accent);
      transition: width 200ms ease;
    }

    .tabs {
      display: flex;
      gap: 8px;
      border-bottom: 2px solid var(--line);
    }

    button {
      appearance: none;
      border: none;
      border-radius: 8px;
      padding: 8px 16px;
      font-weight: 600;
      cursor: pointer;
      color: white;
      background: #4f46e5;
    }

    button:disabled {
      background: #475569;
      color: var(--muted);
      cursor: not-allowed;
    }

    .tab {
      background: transparent;
      color: var(--muted);
      border-radius: 8px 8px 0 0;
    }

    .tab.active {
      background: var(--panel);
      color: var(--accent);
    }

    input {
      width: 100%;
      padding: 12px 14px;
      font-size: 1rem;
      background: var(--panel);
      color: var(--ink);
      border: 2px solid var(--line);
      border-radius: 12px;
    }

    .error {
      border: 1px solid var(--danger);
      background: rgba(248, 113, 113, 0.15);
      color: #fecaca;
      border-radius: 10px;
      padding: 12px;
      text-align: center;
    }

    .error[hidden], .loading[hidden], dialog:not([open]) {
      display: none;
    }

    .loading, .empty {
      text-align: center;
      color: var(--muted);
      padding: 32px 0;
    }

    .grid {
      display: grid;
      grid-template-columns: repeat(auto-fill, minmax(240px, 1fr));
      gap: 14px;
    }

    .card {
      background: var(--panel);
      border: 1px solid var(--line);
      border-radius: 12px;
      padding: 14px;
      text-align: center;
      display: grid;
      gap: 8px;
    }

    .card.updating {
      opacity: 0.55;
      cursor: wait;
    }

    .card.malformed {
      border-color: var(--danger);
      color: #fecaca;
    }

    .card h3 {
      margin: 0;
      font-size: 1.5rem;
      color: var(--accent);
    }

    .card .meta {
      font-size: 0.8rem;
      color: var(--muted);
    }

    .counter {
      display: flex;
      align-items: center;
      justify-content: center;
      gap: 12px;
      font-size: 1.4rem;
      font-weight: 700;
    }

    .counter button {
      width: 40px;
      height: 40px;
      border-radius: 999px;
      padding: 0;
      font-size: 1.3rem;
    }

    .counter .plus {
      background: var(--plus);
    }

    .counter .minus {
      background: var(--minus);
    }

    .actions {
      display: flex;
      justify-content: center;
      gap: 12px;
      flex-wrap: wrap;
    }

    dialog {
      background: var(--panel);
      color: var(--ink);
      border: 1px solid var(--line);
      border-radius: 12px;
      width: min(520px, 92vw);
    }

    dialog form {
      display: grid;
      gap: 10px;
    }

    .report-text {
      white-space: pre-wrap;
      line-height: 1.5;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Bhog Distribution</h1>
      <p class="subtitle">Search for a flat number to record a serving.</p>
    </header>

    <section class="summary">
      <div class="subtitle"><span id="day-label">{{DAY_LABEL}}</span> Total Distribution</div>
      <div class="value"><span id="served">{{SERVED}}</span> / <span id="subscribed">{{SUBSCRIBED}}</span></div>
      <div class="bar"><span id="bar"></span></div>
    </section>

    <nav class="tabs">
      <button class="tab" data-day="day1">Day 1</button>
      <button class="tab" data-day="day2">Day 2</button>
    </nav>

    <input id="search" type="search" placeholder="Search by Flat or Name..." autocomplete="off" />

    <div class="error" id="error" hidden>
      <p><strong>Error:</strong> <span id="error-text"></span></p>
      <button id="retry">Retry</button>
    </div>

    <div class="loading" id="loading" hidden>Loading all distribution data...</div>
    <div class="grid" id="cards"></div>

    <div class="actions">
      <button id="open-add">Add Flat</button>
      <button id="report">Generate AI Report</button>
    </div>
  </main>

  <dialog id="add-dialog">
    <form id="add-form">
      <h2>Add New Flat</h2>
      <input name="flat_number" placeholder="Flat Number" required />
      <input name="subscribed_plates" type="number" min="1" value="1" required />
      <input name="name" placeholder="Name (optional)" />
      <input name="phone_number" placeholder="Phone Number (optional)" />
      <input name="amount_paid" type="number" min="0" step="0.01" placeholder="Amount Paid (optional)" />
      <div class="error" id="add-error" hidden></div>
      <div class="actions">
        <button type="button" id="close-add">Cancel</button>
        <button type="submit" id="submit-add">Add Flat</button>
      </div>
    </form>
  </dialog>

  <dialog id="report-dialog">
    <h2>Distribution Report</h2>
    <p class="report-text" id="report-text"></p>
    <div class="actions"><button id="close-report">Close</button></div>
  </dialog>

  <script>
    const $ = (id) => document.getElementById(id);
    let current = null;
    let pollTimer = null;
    let searchTimer = null;

    const api = async (path, body) => {
      const options = body === undefined
        ? {}
        : { method: 'POST', headers: { 'content-type': 'application/json' }, body: JSON.stringify(body) };
      const res = await fetch(path, options);
      if (!res.ok) {
        throw new Error((await res.text()) || res.statusText);
      }
      return res.json();
    };

    const el = (tag, className, text) => {
      const node = document.createElement(tag);
      if (className) node.className = className;
      if (text !== undefined) node.textContent = text;
      return node;
    };

    const card = (record, day) => {
      if (record.malformed) {
        const node = el('div', 'card malformed');
        node.append(
          el('h3', '', 'Data Error'),
          el('div', 'meta', "Missing flat number. Check that the sheet headers match the expected names."),
          el('div', 'meta', `Sheet Row: ${record.row_index}`)
        );
        return node;
      }

      const node = el('div', record.updating ? 'card updating' : 'card');
      node.append(el('h3', '', record.flat_number));
      if (record.name) node.append(el('div', '', record.name));
      if (record.phone_number) node.append(el('div', 'meta', `Phone: ${record.phone_number}`));
      if (record.amount_paid !== null && record.amount_paid !== undefined) {
        node.append(el('div', 'meta', `Amount Paid: ₹${record.amount_paid}`));
      }

      const counter = el('div', 'counter');
      const minus = el('button', 'minus', '−');
      const plus = el('button', 'plus', '+');
      minus.disabled = record.updating || record.served <= 0;
      plus.disabled = record.updating || record.served >= record.subscribed;
      minus.onclick = () => setServed(record, day, record.served - 1);
      plus.onclick = () => setServed(record, day, record.served + 1);
      counter.append(minus, el('span', '', `${record.served} / ${record.subscribed}`), plus);
      node.append(counter);
      return node;
    };

    const render = (view) => {
      current = view;
      $('day-label').textContent = view.day_label;
      $('served').textContent = view.summary.total_served;
      $('subscribed').textContent = view.summary.total_subscribed;
      const pct = view.summary.total_subscribed > 0
        ? (view.summary.total_served / view.summary.total_subscribed) * 100
        : 0;
      $('bar').style.width = `${pct}%`;

      document.querySelectorAll('.tab').forEach((tab) => {
        tab.classList.toggle('active', tab.dataset.day === view.active_day);
      });

      $('error').hidden = !view.error;
      $('error-text').textContent = view.error || '';
      $('loading').hidden = !view.loading;

      const cards = $('cards');
      cards.replaceChildren();
      if (!view.loading) {
        if (view.records.length > 0) {
          view.records.forEach((record) => cards.append(card(record, view.active_day)));
        } else if (view.loaded_records === 0) {
          cards.append(el('p', 'empty', `No data loaded for ${view.day_label}.`));
        } else {
          cards.append(el('p', 'empty', 'No flats found matching your search.'));
        }
      }

      const report = $('report');
      report.textContent = `Generate AI Report for ${view.day_label}`;
      report.disabled = view.loaded_records === 0 || view.report.loading;
      renderReport(view.report);

      schedulePoll(view.loading || view.records.some((record) => record.updating));
    };

    const renderReport = (report) => {
      $('report-text').textContent = report.loading
        ? 'Generating report...'
        : report.content || '';
    };

    const schedulePoll = (needed) => {
      clearTimeout(pollTimer);
      if (needed) {
        pollTimer = setTimeout(() => refresh(), 400);
      }
    };

    const refresh = () => api('/api/state').then(render).catch((err) => console.error(err));

    const setServed = (record, day, newCount) => {
      api('/api/served', { row_index: record.row_index, day, new_count: newCount })
        .then(render)
        .catch((err) => console.error(err));
    };

    const pollReport = async () => {
      const report = await api('/api/report');
      renderReport(report);
      if (report.loading) {
        setTimeout(pollReport, 600);
      } else {
        refresh();
      }
    };

    document.querySelectorAll('.tab').forEach((tab) => {
      tab.addEventListener('click', () => api('/api/day', { day: tab.dataset.day }).then(render));
    });

    $('search').addEventListener('input', (event) => {
      clearTimeout(searchTimer);
      const term = event.target.value;
      searchTimer = setTimeout(() => api('/api/search', { term }).then(render), 150);
    });

    $('retry').addEventListener('click', () => {
      $('loading').hidden = false;
      api('/api/reload', {}).then(render).catch((err) => console.error(err));
    });

    $('report').addEventListener('click', () => {
      $('report-dialog').showModal();
      api('/api/report', {})
        .then((report) => {
          renderReport(report);
          if (report.loading) pollReport();
        })
        .catch((err) => { $('report-text').textContent = err.message; });
    });
    $('close-report').addEventListener('click', () => $('report-dialog').close());

    const addForm = $('add-form');
    $('open-add').addEventListener('click', () => $('add-dialog').showModal());
    $('close-add').addEventListener('click', () => {
      addForm.reset();
      $('add-error').hidden = true;
      $('add-dialog').close();
    });

    addForm.addEventListener('submit', (event) => {
      event.preventDefault();
      const data = new FormData(addForm);
      const text = (key) => (data.get(key) || '').toString().trim() || null;
      const draft = {
        flat_number: text('flat_number') || '',
        subscribed_plates: Number(data.get('subscribed_plates')) || 0,
        name: text('name'),
        phone_number: text('phone_number'),
        amount_paid: text('amount_paid') === null ? null : Number(text('amount_paid')),
      };
      $('submit-add').disabled = true;
      api('/api/records', draft)
        .then((view) => {
          addForm.reset();
          $('add-error').hidden = true;
          $('add-dialog').close();
          render(view);
        })
        .catch((err) => {
          $('add-error').textContent = err.message;
          $('add-error').hidden = false;
        })
        .finally(() => { $('submit-add').disabled = false; });
    });

    refresh();
  </script>
</body>
</html>
"#;
